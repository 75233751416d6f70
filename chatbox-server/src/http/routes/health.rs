//! Health check endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::http::{ApiError, DbSession};
use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub open_sessions: usize,
}

/// Database health response
#[derive(Debug, Serialize)]
pub struct DatabaseHealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        open_sessions: state.sessions.open_sessions(),
    })
}

/// GET /health/db
///
/// Runs `SELECT 1` in the request's session.
async fn database_health(
    mut session: DbSession,
) -> Result<Json<DatabaseHealthResponse>, ApiError> {
    session.execute(sqlx::query("SELECT 1")).await?;
    session.close().await?;

    Ok(Json(DatabaseHealthResponse {
        status: "ok",
        backend: session.backend().as_str(),
    }))
}

/// Health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/health/db", get(database_health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbox_db::{Engine, PoolSettings, SessionFactory};

    fn sqlite_state() -> Arc<AppState> {
        let engine = Engine::connect("sqlite::memory:", &PoolSettings::default()).unwrap();
        Arc::new(AppState::new(SessionFactory::new(engine)))
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let Json(body) = health(State(sqlite_state())).await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.open_sessions, 0);
    }

    #[tokio::test]
    async fn database_health_closes_session() {
        let state = sqlite_state();
        let session = DbSession(state.sessions.open());

        let Json(body) = database_health(session).await.unwrap();
        assert_eq!(body.backend, "sqlite");
        assert_eq!(state.sessions.open_sessions(), 0);
    }
}
