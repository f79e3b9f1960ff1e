//! Durable message types.
//!
//! Outbox and inbox rows are self-contained envelopes: a type tag, an
//! opaque payload, and a pending/processed status. They reference nothing
//! by foreign key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Status of a durable message row
///
/// The only transition is pending -> processed; processed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageStatus {
    /// Awaiting dispatch (outbox) or effect commit (inbox)
    Pending,
    /// Dispatched / effect committed
    Processed,
}

impl MessageStatus {
    /// Database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Pending => "pending",
            MessageStatus::Processed => "processed",
        }
    }

    /// Parse the database representation
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(MessageStatus::Pending),
            "processed" => Ok(MessageStatus::Processed),
            other => Err(MessagingError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Intent to publish, persisted in the same transaction as the state
/// change it describes
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub message_type: String,
    pub payload: Vec<u8>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OutboxMessage {
    /// Create a pending outbox message with a fresh id
    pub fn new(message_type: impl Into<String>, payload: Vec<u8>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            message_type: message_type.into(),
            payload,
            status: MessageStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Receipt of an external event, persisted in the same transaction as the
/// resulting state change
///
/// The id is derived deterministically from the event (see
/// [`crate::inbox::message_id`]) so that redelivered events collide on the
/// primary key.
#[derive(Debug, Clone, PartialEq)]
pub struct InboxMessage {
    pub id: Uuid,
    pub message_type: String,
    pub payload: Vec<u8>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InboxMessage {
    /// Create a pending inbox message under a caller-derived id
    pub fn new(id: Uuid, message_type: impl Into<String>, payload: Vec<u8>) -> Self {
        let now = Utc::now();
        Self {
            id,
            message_type: message_type.into(),
            payload,
            status: MessageStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Messaging layer errors
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    /// Insert collided with an already-recorded message id
    #[error("Duplicate message: {0}")]
    DuplicateMessage(Uuid),

    /// Unknown status string read from the database
    #[error("Invalid message status: {0}")]
    InvalidStatus(String),

    /// Broker publication failed
    #[error("Publish error: {0}")]
    Publish(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Payload (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for messaging operations
pub type Result<T> = std::result::Result<T, MessagingError>;

/// Check if a database error is a unique constraint violation
pub(crate) fn is_unique_violation(db_err: &dyn sqlx::error::DatabaseError) -> bool {
    db_err.code() == Some(std::borrow::Cow::Borrowed("23505"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_outbox_message_is_pending() {
        let message = OutboxMessage::new("order_created", b"{}".to_vec());
        assert_eq!(message.status, MessageStatus::Pending);
        assert_eq!(message.message_type, "order_created");
        assert!(!message.id.is_nil());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [MessageStatus::Pending, MessageStatus::Processed] {
            assert_eq!(MessageStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(MessageStatus::parse("published").is_err());
    }
}
