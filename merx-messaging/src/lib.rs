//! Merx Durable Messaging
//!
//! Transactional outbox/inbox primitives shared by the order and payment
//! services:
//! - Outbox rows persisted in the same transaction as the state change
//! - Inbox rows with deterministic ids for race-free deduplication
//! - A polling dispatcher that publishes pending rows to the broker
//!
//! # Usage
//!
//! ```rust,no_run
//! use merx_messaging::{outbox, OutboxMessage};
//!
//! # async fn example(pool: sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//! let mut tx = pool.begin().await?;
//!
//! // ... mutate service state in the same transaction ...
//!
//! let message = OutboxMessage::new("order_created", b"{...}".to_vec());
//! outbox::enqueue(&mut tx, &message).await?;
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```

pub mod dispatcher;
pub mod inbox;
pub mod outbox;
pub mod types;

pub use dispatcher::{DispatcherConfig, OutboxDispatcher, OutboxPublisher};
pub use types::{InboxMessage, MessageStatus, MessagingError, OutboxMessage, Result};
