//! Consumer loop for `OrderCreatedEvent`s on the orders topic.
//!
//! The offset is committed once the saga reports the effect durable
//! (applied now or on a prior delivery). A saga failure leaves the offset
//! uncommitted, so the broker redelivers and inbox dedup keeps the retry
//! from double-applying.

use tracing::{error, info, warn};

use merx_broker::{BorrowedMessage, EventConsumer};
use merx_domain::OrderCreatedEvent;

use crate::error::PaymentdResult;
use crate::saga::PaymentSaga;

/// Consumer loop driving the payment saga
pub struct OrderWorker {
    consumer: EventConsumer,
    saga: PaymentSaga,
}

impl OrderWorker {
    pub fn new(consumer: EventConsumer, saga: PaymentSaga) -> Self {
        Self { consumer, saga }
    }

    /// Run the worker loop
    ///
    /// Returns when shutdown is signaled via the cancellation token.
    pub async fn run(self, shutdown: tokio_util::sync::CancellationToken) {
        info!("Order worker started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Order worker shutdown requested");
                    break;
                }
                result = self.consumer.recv() => {
                    match result {
                        Ok(message) => {
                            if let Err(e) = self.handle(&message).await {
                                // Offset not committed: the broker will redeliver
                                error!(error = %e, "Failed to process order-created event (will retry)");
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "Consumer error");
                        }
                    }
                }
            }
        }

        info!("Order worker stopped");
    }

    async fn handle(&self, message: &BorrowedMessage<'_>) -> PaymentdResult<()> {
        let event: OrderCreatedEvent = match EventConsumer::decode(message) {
            Ok(event) => event,
            Err(e) => {
                // Malformed payloads are dropped, not retried
                warn!(error = %e, "Dropping undecodable order-created event");
                self.consumer.commit(message)?;
                return Ok(());
            }
        };

        self.saga.process_order_created(&event).await?;
        self.consumer.commit(message)?;
        Ok(())
    }
}
