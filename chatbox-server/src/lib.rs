//! chatbox-server: HTTP backend for chatbox
//!
//! Wires the database session provider from `chatbox-db` into axum: one
//! engine per process, one session per request.

pub mod http;
pub mod state;
pub mod tracing_setup;

pub use http::{build_router, run_server, ServerConfig};
pub use state::AppState;
