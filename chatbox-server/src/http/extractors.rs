//! Custom Axum extractors

use std::convert::Infallible;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chatbox_db::Session;

use crate::state::AppState;

/// A database session scoped to one request.
///
/// Opening never fails; connection problems surface on the first statement.
/// The session is closed when the handler returns and the extractor is
/// dropped, rolling back anything the handler did not commit.
#[derive(Debug)]
pub struct DbSession(pub Session);

impl FromRequestParts<Arc<AppState>> for DbSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(state.sessions.open()))
    }
}

impl Deref for DbSession {
    type Target = Session;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DbSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use chatbox_db::{Engine, PoolSettings, SessionFactory};

    #[tokio::test]
    async fn each_extraction_opens_a_new_session() {
        let engine = Engine::connect("sqlite::memory:", &PoolSettings::default()).unwrap();
        let state = Arc::new(AppState::new(SessionFactory::new(engine)));

        let (mut parts, _) = Request::new(()).into_parts();
        let first = DbSession::from_request_parts(&mut parts, &state).await.unwrap();
        let second = DbSession::from_request_parts(&mut parts, &state).await.unwrap();

        assert_ne!(first.id(), second.id());
        assert!(first.is_open());
        assert_eq!(state.sessions.open_sessions(), 2);

        drop(first);
        drop(second);
        assert_eq!(state.sessions.open_sessions(), 0);
    }
}
