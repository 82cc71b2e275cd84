//! TicketDesk Server
//!
//! REST backend for ticket tracking with team assignment and role-based access.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use ticketdesk_core::config::{self, Config};
use ticketdesk_core::tracing_init::{LogFormat, default_filter, init_tracing};
use ticketdesk_server::api::{AppState, SessionCookies, build_router};
use ticketdesk_server::auth::JwtManager;
use ticketdesk_server::storage::TicketDatabase;

const DEV_SECRET: &str = "dev-secret-change-me";

#[derive(Parser, Debug)]
#[command(name = "ticketdesk-server")]
#[command(version, about = "TicketDesk server - ticket tracking REST API")]
struct Args {
    /// Address to listen on (overrides config).
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Path to SQLite database file.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// JWT secret key.
    #[arg(long, env = "TICKETDESK_JWT_SECRET", default_value = DEV_SECRET)]
    jwt_secret: String,

    /// Session token TTL in seconds.
    #[arg(long)]
    session_ttl: Option<i64>,

    /// Development mode: session cookies without `Secure`.
    #[arg(long)]
    dev: bool,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(addr) = self.addr {
            config.server.addr = addr.to_string();
        }
        if let Some(path) = &self.db_path {
            config.server.database_path = Some(path.clone());
        }
        if let Some(ttl) = self.session_ttl {
            config.session.ttl_secs = ttl;
        }
        if self.dev {
            config.server.dev_mode = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = config::load_config()?;
    args.apply(&mut config);
    config.validate()?;

    let format = if args.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(
        &default_filter(env!("CARGO_PKG_NAME"), &config.server.log_level),
        format,
    );

    let addr: SocketAddr = config
        .server
        .addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.server.addr))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %addr,
        dev_mode = config.server.dev_mode,
        "Starting ticketdesk-server"
    );

    if args.jwt_secret == DEV_SECRET && !config.server.dev_mode {
        warn!("Using the built-in JWT secret; set TICKETDESK_JWT_SECRET in production");
    }

    let db_path = config
        .server
        .database_path
        .clone()
        .or_else(config::database_path)
        .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    info!(path = %db_path.display(), "Opening ticket database");
    let db = TicketDatabase::open(&db_path, config.server.max_connections).await?;

    let jwt = Arc::new(JwtManager::new(
        args.jwt_secret.as_bytes(),
        config.session.ttl_secs,
    ));
    let cookies = SessionCookies::new(
        config.session.cookie_name.clone(),
        !config.server.dev_mode,
    );
    let router = build_router(AppState::new(db, jwt, cookies));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
