//! Outbox dispatcher: polls pending outbox rows and publishes them.
//!
//! One cooperative loop per service. Each tick drains up to a batch of
//! pending rows in created-at order; a publish failure stops the batch and
//! the remaining rows are retried on the next tick. A crash between broker
//! acknowledgement and the status update causes republication, so delivery
//! is at-least-once and deduplication belongs to the consumer.

use crate::outbox;
use crate::types::{OutboxMessage, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

/// Sink for outbox messages (the broker producer in production, a mock in
/// tests)
#[async_trait]
pub trait OutboxPublisher: Send + Sync {
    /// Publish one message; must not mark anything processed itself
    async fn publish(&self, message: &OutboxMessage) -> Result<()>;
}

#[async_trait]
impl<P: OutboxPublisher + ?Sized> OutboxPublisher for std::sync::Arc<P> {
    async fn publish(&self, message: &OutboxMessage) -> Result<()> {
        (**self).publish(message).await
    }
}

/// Dispatcher tuning
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Poll interval between batches in milliseconds
    pub poll_interval_ms: u64,
    /// Maximum rows drained per tick
    pub batch_size: i64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            batch_size: 10,
        }
    }
}

/// Outbox dispatcher loop
pub struct OutboxDispatcher<P> {
    pool: PgPool,
    publisher: P,
    config: DispatcherConfig,
}

impl<P: OutboxPublisher> OutboxDispatcher<P> {
    /// Create a new dispatcher
    pub fn new(pool: PgPool, publisher: P, config: DispatcherConfig) -> Self {
        Self {
            pool,
            publisher,
            config,
        }
    }

    /// Run the dispatcher loop
    ///
    /// Returns when shutdown is signaled via the cancellation token. The
    /// row currently being dispatched is finished first.
    pub async fn run(self, shutdown: tokio_util::sync::CancellationToken) {
        info!(
            poll_interval_ms = self.config.poll_interval_ms,
            batch_size = self.config.batch_size,
            "Outbox dispatcher started"
        );

        let mut ticker = interval(Duration::from_millis(self.config.poll_interval_ms));
        ticker.tick().await; // First tick is immediate

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Outbox dispatcher shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    match self.process_pending().await {
                        Ok(count) if count > 0 => {
                            debug!(count, "Dispatched outbox messages");
                        }
                        Err(e) => {
                            warn!(error = %e, "Outbox dispatch error (will retry)");
                        }
                        _ => {}
                    }
                }
            }
        }

        info!("Outbox dispatcher stopped");
    }

    /// Drain one batch of pending messages
    ///
    /// Publishes each row and marks it processed. Stops at the first
    /// publish failure so that subsequent rows keep their created-at order
    /// on retry.
    pub async fn process_pending(&self) -> Result<usize> {
        let messages = outbox::fetch_pending(&self.pool, self.config.batch_size).await?;

        let mut dispatched = 0;
        for message in &messages {
            if let Err(e) = self.publisher.publish(message).await {
                warn!(
                    message_id = %message.id,
                    message_type = %message.message_type,
                    error = %e,
                    "Failed to publish outbox message (will retry)"
                );
                break;
            }

            outbox::mark_processed(&self.pool, message.id).await?;
            dispatched += 1;
        }

        Ok(dispatched)
    }
}
