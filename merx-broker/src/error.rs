//! Broker adapter errors.

use thiserror::Error;

/// Errors from the Kafka adapters
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Client creation / connection failure
    #[error("Broker connection error: {0}")]
    Connection(String),

    /// Publish failure
    #[error("Broker publish error: {0}")]
    Publish(String),

    /// Receive / subscribe / commit failure
    #[error("Broker consume error: {0}")]
    Consume(String),

    /// Payload was not valid JSON for the expected event
    #[error("Failed to decode message payload: {0}")]
    Decode(#[from] serde_json::Error),
}
