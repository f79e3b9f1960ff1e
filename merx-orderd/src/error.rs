//! Order service error types.

use merx_broker::BrokerError;
use merx_domain::DomainError;
use merx_messaging::MessagingError;
use thiserror::Error;

/// Order service errors.
#[derive(Debug, Error)]
pub enum OrderdError {
    /// Malformed command: empty items, unknown product
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Insert collided with existing state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Domain validation error
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Durable messaging error
    #[error("Messaging error: {0}")]
    Messaging(#[from] MessagingError),

    /// Broker adapter error
    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    /// Payload (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Startup failure (DB unreachable, migrations failed)
    #[error("Startup error: {0}")]
    Startup(String),

    /// I/O error (listener bind, signal handling)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for OrderdError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err)
                if db_err.code().map(|c| c == "23505").unwrap_or(false) =>
            {
                OrderdError::Conflict(db_err.to_string())
            }
            _ => OrderdError::Database(err),
        }
    }
}

/// Result type for order service operations.
pub type OrderdResult<T> = Result<T, OrderdError>;
