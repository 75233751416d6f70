//! Application state shared across handlers

use chatbox_db::{Engine, SessionFactory};

/// Shared application state
///
/// Holds the session factory, and through it the process-wide engine.
#[derive(Debug, Clone)]
pub struct AppState {
    pub sessions: SessionFactory,
}

impl AppState {
    pub fn new(sessions: SessionFactory) -> Self {
        Self { sessions }
    }

    pub fn engine(&self) -> &Engine {
        self.sessions.engine()
    }
}
