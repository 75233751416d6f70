//! chatbox-db: database configuration and sessions for the chatbox backend
//!
//! Startup reads `config.yaml` (or `DATABASE_URL`), builds one [`Engine`],
//! and wraps it in a [`SessionFactory`]. Each request then opens its own
//! [`Session`], which is closed on every exit path.

pub mod config;
pub mod engine;
pub mod error;
pub mod session;

pub use config::{PoolSettings, Settings, DATABASE_URL_ENV};
pub use engine::{Backend, Engine};
pub use error::{ConfigError, EngineError, Error, Result, SessionError};
pub use session::{Session, SessionConfig, SessionFactory, SessionState};
