//! Error types for `TicketDesk` core library.

use thiserror::Error;

/// Result type alias using `TicketDesk` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `TicketDesk` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
