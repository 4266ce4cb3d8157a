/// HTTP session API tests
/// Drives the handlers directly with an in-memory lead table
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use cuidarte_leads::config::Config;
use cuidarte_leads::errors::AppError;
use cuidarte_leads::form::FormField;
use cuidarte_leads::handlers::{self, AppState, StartSessionRequest, UpdateFieldRequest};
use cuidarte_leads::record_store::{MemoryRecordStore, RecordStore};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

fn app(store: &MemoryRecordStore) -> Arc<AppState> {
    let config = Config::for_store("http://localhost:54321");
    Arc::new(AppState::new(config, Arc::new(store.clone())))
}

fn expect_err(result: Result<Response, AppError>) -> AppError {
    match result {
        Ok(response) => panic!("expected an error, got {}", response.status()),
        Err(e) => e,
    }
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn start(state: &Arc<AppState>, cookie: Option<&'static str>, url: &str) -> Response {
    let mut headers = HeaderMap::new();
    if let Some(cookie) = cookie {
        headers.insert(header::COOKIE, HeaderValue::from_static(cookie));
    }
    handlers::start_session(
        State(Arc::clone(state)),
        headers,
        Json(StartSessionRequest {
            entry_url: url.to_string(),
            timezone: Some("America/Bogota".to_string()),
        }),
    )
    .await
    .unwrap()
}

async fn set_field(state: &Arc<AppState>, id: Uuid, field: FormField, value: Value) -> Response {
    handlers::update_field(
        State(Arc::clone(state)),
        Path(id),
        Json(UpdateFieldRequest {
            field,
            value: serde_json::from_value(value).unwrap(),
        }),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_new_visitor_gets_registration_view() {
    let store = MemoryRecordStore::new();
    let state = app(&store);

    let response = start(
        &state,
        None,
        "https://escuela.example.com/registro?utm_source=fb",
    )
    .await;
    assert!(set_cookie(&response).contains("Max-Age=0"));

    let json = body_json(response).await;
    assert_eq!(json["view"]["screen"], "registration");
    assert_eq!(json["view"]["form"]["country"], "Colombia");
    assert_eq!(json["view"]["form"]["countryCode"], "+57");
}

#[tokio::test]
async fn test_full_registration_flow() {
    let store = MemoryRecordStore::new();
    let state = app(&store);

    let json = body_json(start(&state, None, "https://escuela.example.com/registro").await).await;
    let id: Uuid = serde_json::from_value(json["session_id"].clone()).unwrap();

    set_field(&state, id, FormField::Name, "Sofía".into()).await;
    set_field(&state, id, FormField::Country, "Otros".into()).await;
    let json = body_json(set_field(&state, id, FormField::Consent, true.into()).await).await;
    assert_eq!(json["view"]["dial_code_editable"], true);
    assert_eq!(json["view"]["form"]["countryCode"], "+");

    let response = handlers::submit(State(Arc::clone(&state)), Path(id))
        .await
        .unwrap();
    assert!(set_cookie(&response).starts_with("cuidarte_uid=lead-1;"));
    let json = body_json(response).await;
    assert_eq!(json["view"]["screen"], "success");
    assert_eq!(
        json["view"]["magic_link"],
        "https://escuela.example.com/registro?uid=lead-1"
    );
    assert_eq!(json["view"]["celebration"]["particle_count"], 150);
    assert_eq!(store.get("lead-1").unwrap().country, "Otros");

    let json = body_json(
        handlers::open_kit(State(Arc::clone(&state)), Path(id))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(json["view"]["screen"], "gated_kit");

    let json = body_json(
        handlers::dismiss_kit(State(Arc::clone(&state)), Path(id))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(json["view"]["screen"], "success");
    assert!(json["view"]["celebration"].is_null());
}

#[tokio::test]
async fn test_returning_cookie_reopens_kit() {
    let store = MemoryRecordStore::new();
    let lead = cuidarte_leads::form::FormState {
        consent: true,
        ..Default::default()
    }
    .normalize_for_submission();
    let lead_id = store.create(&lead).await.unwrap();
    assert_eq!(lead_id, "lead-1");

    let state = app(&store);
    let response = start(&state, Some("cuidarte_uid=lead-1"), "https://escuela.example.com/").await;
    assert!(set_cookie(&response).starts_with("cuidarte_uid=lead-1;"));
    assert_eq!(body_json(response).await["view"]["screen"], "gated_kit");
}

#[tokio::test]
async fn test_stale_cookie_is_cleared() {
    let store = MemoryRecordStore::new();
    let state = app(&store);

    let response = start(&state, Some("cuidarte_uid=gone"), "https://escuela.example.com/").await;
    assert!(set_cookie(&response).contains("Max-Age=0"));

    let json = body_json(response).await;
    assert_eq!(json["view"]["status"], "idle_with_error");
    assert!(json["view"]["error_message"]
        .as_str()
        .unwrap()
        .starts_with("El enlace de acceso ha caducado"));
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let state = app(&MemoryRecordStore::new());
    let err = expect_err(handlers::get_session(State(state), Path(Uuid::new_v4())).await);
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_operation_is_busy() {
    let store = MemoryRecordStore::new();
    let state = app(&store);
    let json = body_json(start(&state, None, "https://escuela.example.com/").await).await;
    let id: Uuid = serde_json::from_value(json["session_id"].clone()).unwrap();

    let session = state.sessions.get(&id).await.unwrap();
    let _held = session.lock().await;

    let err = expect_err(handlers::submit(State(Arc::clone(&state)), Path(id)).await);
    assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
}
