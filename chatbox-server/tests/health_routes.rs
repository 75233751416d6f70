//! Router-level tests for the health endpoints

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chatbox_db::{Engine, PoolSettings, SessionFactory};
use chatbox_server::{build_router, AppState};
use serde_json::Value;
use tower::ServiceExt;

fn state_for(url: &str) -> (AppState, SessionFactory) {
    let pool = PoolSettings {
        max_connections: Some(1),
        acquire_timeout_secs: Some(1),
    };
    let engine = Engine::connect(url, &pool).unwrap();
    let sessions = SessionFactory::new(engine);
    (AppState::new(sessions.clone()), sessions)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (state, _) = state_for("sqlite::memory:");
    let app = build_router(state, false);

    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["open_sessions"], 0);
}

#[tokio::test]
async fn database_health_uses_and_releases_a_session() {
    let (state, sessions) = state_for("sqlite::memory:");
    let app = build_router(state, false);

    let (status, body) = get(app.clone(), "/health/db").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend"], "sqlite");
    assert_eq!(sessions.open_sessions(), 0);

    // The pool has one connection; a leaked session would starve this request.
    let (status, _) = get(app, "/health/db").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unreachable_database_is_503() {
    let (state, sessions) = state_for("postgres://u:p@127.0.0.1:1/chatbox");
    let app = build_router(state, false);

    let (status, body) = get(app, "/health/db").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "database_unavailable");
    assert_eq!(sessions.open_sessions(), 0);
}
