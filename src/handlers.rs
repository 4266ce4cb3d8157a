use crate::attribution::EntryContext;
use crate::config::Config;
use crate::controller::LandingController;
use crate::errors::{AppError, ResultExt};
use crate::form::{FieldValue, FormField};
use crate::identifier_store::{MemoryIdentifierStore, IDENTIFIER_KEY};
use crate::record_store::RecordStore;
use crate::views::View;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// One visitor's controller. Its identifier slot is mirrored to the `cuidarte_uid` cookie.
pub struct Session {
    pub controller: LandingController,
}

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Hosted lead table.
    pub store: Arc<dyn RecordStore>,
    /// Live page sessions, evicted after `session_ttl_secs` of inactivity.
    pub sessions: Cache<Uuid, Arc<Mutex<Session>>>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn RecordStore>) -> Self {
        let sessions = Cache::builder()
            .time_to_idle(Duration::from_secs(config.session_ttl_secs))
            .max_capacity(10_000)
            .build();
        Self {
            config,
            store,
            sessions,
        }
    }

    async fn session(&self, id: Uuid) -> Result<Arc<Mutex<Session>>, AppError> {
        self.sessions
            .get(&id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
    }
}

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    /// Full URL the page was opened with.
    pub entry_url: String,
    /// IANA timezone reported by the browser.
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFieldRequest {
    pub field: FormField,
    pub value: FieldValue,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub view: View,
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "cuidarte-leads",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Reads the remembered identifier from the request cookies.
pub fn identifier_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == IDENTIFIER_KEY)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Mirrors the identifier slot back to the browser.
fn identifier_cookie(identifier: Option<&str>) -> Result<HeaderValue, AppError> {
    let cookie = match identifier {
        Some(id) => format!(
            "{}={}; Path=/; Max-Age=31536000; SameSite=Lax; HttpOnly",
            IDENTIFIER_KEY, id
        ),
        None => format!("{}=; Path=/; Max-Age=0; SameSite=Lax; HttpOnly", IDENTIFIER_KEY),
    };
    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::InternalError(format!("Invalid cookie value: {}", e)))
}

fn respond(state: &AppState, session_id: Uuid, session: &mut Session) -> Result<Response, AppError> {
    let view = View::render(&mut session.controller, &state.config)?;
    let cookie = identifier_cookie(session.controller.remembered_identifier().as_deref())?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse { session_id, view }),
    )
        .into_response())
}

/// Locks a session, refusing if another of its operations is still running.
fn try_lock(session: &Arc<Mutex<Session>>) -> Result<tokio::sync::MutexGuard<'_, Session>, AppError> {
    session
        .try_lock()
        .map_err(|_| AppError::Busy("Another operation is in progress".to_string()))
}

/// POST /api/v1/sessions
///
/// Opens the page: detects locale and attribution, then resolves the
/// initial view from the `uid` parameter or the `cuidarte_uid` cookie.
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<StartSessionRequest>,
) -> Result<Response, AppError> {
    let entry = EntryContext::detect(&request.entry_url, request.timezone.as_deref())?;

    let identifiers = match identifier_from_cookies(&headers) {
        Some(id) => MemoryIdentifierStore::with_identifier(id),
        None => MemoryIdentifierStore::new(),
    };
    let mut session = Session {
        controller: LandingController::new(Arc::clone(&state.store), Arc::new(identifiers)),
    };
    session.controller.start(&entry).await;

    let session_id = Uuid::new_v4();
    tracing::info!(
        "Session {} started in {}",
        session_id,
        session.controller.state().name()
    );

    let response = respond(&state, session_id, &mut session)?;
    state
        .sessions
        .insert(session_id, Arc::new(Mutex::new(session)))
        .await;
    Ok(response)
}

/// GET /api/v1/sessions/:id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let session = state.session(session_id).await?;
    let mut guard = try_lock(&session)?;
    respond(&state, session_id, &mut guard)
}

/// POST /api/v1/sessions/:id/fields
pub async fn update_field(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<UpdateFieldRequest>,
) -> Result<Response, AppError> {
    let session = state.session(session_id).await?;
    let mut guard = try_lock(&session)?;
    guard
        .controller
        .update_field(request.field, request.value)
        .with_context(|| format!("Updating field {:?}", request.field))?;
    respond(&state, session_id, &mut guard)
}

/// POST /api/v1/sessions/:id/submit
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let session = state.session(session_id).await?;
    let mut guard = try_lock(&session)?;
    guard.controller.submit().await?;
    respond(&state, session_id, &mut guard)
}

/// POST /api/v1/sessions/:id/kit
pub async fn open_kit(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let session = state.session(session_id).await?;
    let mut guard = try_lock(&session)?;
    guard.controller.open_kit().await;
    respond(&state, session_id, &mut guard)
}

/// POST /api/v1/sessions/:id/dismiss
pub async fn dismiss_kit(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let session = state.session(session_id).await?;
    let mut guard = try_lock(&session)?;
    guard.controller.dismiss_kit().await;
    respond(&state, session_id, &mut guard)
}
