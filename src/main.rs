use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cuidarte_leads::config::Config;
use cuidarte_leads::handlers::{self, AppState};
use cuidarte_leads::record_store::SupabaseRecordStore;

/// Main entry point for the landing page service.
///
/// Initializes tracing, loads configuration, builds the record store client
/// and serves the session API behind rate limiting.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cuidarte_leads=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store = SupabaseRecordStore::new(&config)?;
    tracing::info!("✓ Record store client initialized: {}", config.supabase_url);

    let app_state = Arc::new(AppState::new(config.clone(), Arc::new(store)));
    tracing::info!(
        "Session cache initialized ({}s idle TTL)",
        config.session_ttl_secs
    );

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let protected_routes = Router::new()
        .route("/api/v1/sessions", post(handlers::start_session))
        .route("/api/v1/sessions/:id", get(handlers::get_session))
        .route("/api/v1/sessions/:id/fields", post(handlers::update_field))
        .route("/api/v1/sessions/:id/submit", post(handlers::submit))
        .route("/api/v1/sessions/:id/kit", post(handlers::open_kit))
        .route("/api/v1/sessions/:id/dismiss", post(handlers::dismiss_kit))
        .layer(
            ServiceBuilder::new()
                // Form payloads are tiny
                .layer(RequestBodyLimitLayer::new(64 * 1024))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Health check bypasses rate limiting
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
