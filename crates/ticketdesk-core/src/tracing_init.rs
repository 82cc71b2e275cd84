//! Tracing/logging initialization for the `TicketDesk` binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, one event per line.
    #[default]
    Pretty,
    /// Structured JSON, for log aggregation.
    Json,
}

/// Build the default filter directive for a crate at the given level.
///
/// HTTP request spans from `tower_http` are kept at the same level so that
/// access logs follow the configured verbosity.
pub fn default_filter(crate_name: &str, level: &str) -> String {
    let target = crate_name.replace('-', "_");
    format!("{target}={level},ticketdesk_core={level},tower_http={level}")
}

/// Initialise the global tracing subscriber.
///
/// `RUST_LOG`, when set, takes precedence over `default_filter`.
pub fn init_tracing(default_filter: &str, format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
    );
    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}
