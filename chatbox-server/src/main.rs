//! chatbox backend entry point
//!
//! Loads `config.yaml` (or `DATABASE_URL`), creates the database engine once,
//! and serves HTTP until Ctrl+C/SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chatbox_db::{Engine, SessionFactory, Settings};
use chatbox_server::http::server::DEFAULT_BIND;
use chatbox_server::tracing_setup::{self, TracingConfig};
use chatbox_server::{run_server, AppState, ServerConfig};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "chatbox", author, version, about = "Chat backend with per-request database sessions")]
struct Cli {
    /// Path to config.yaml (default: config.yaml next to the chatbox executable)
    #[arg(long, short = 'c', env = "CHATBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind to (overrides server.bind in config.yaml)
    #[arg(long, short = 'b')]
    bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    cors_permissive: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before reading DATABASE_URL; a missing file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    tracing_setup::init(&TracingConfig { debug: cli.debug })?;

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("failed to load configuration")?;

    let database_url = settings
        .resolve_connection_string()
        .context("failed to resolve database connection string")?;

    let engine = Engine::connect(&database_url, &settings.pool())
        .context("failed to create database engine")?;

    let config = ServerConfig {
        bind_addr: cli.bind.or(settings.server_bind()).unwrap_or(DEFAULT_BIND),
        cors_permissive: cli.cors_permissive,
    };

    run_server(AppState::new(SessionFactory::new(engine)), config)
        .await
        .context("server error")?;

    Ok(())
}
