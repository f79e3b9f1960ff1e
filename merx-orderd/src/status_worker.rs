//! Status reconciliation: consumes payment outcomes and finalises orders.
//!
//! The broker offset is committed only after the status update is durable,
//! so a crash mid-update causes redelivery. The update itself is guarded
//! (`WHERE status = 'NEW'`), so redelivery and buggy upstreams cannot move
//! an order out of a terminal status.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use merx_broker::{BorrowedMessage, EventConsumer};
use merx_domain::{OrderStatus, OrderStatusUpdatedEvent};

use crate::error::OrderdResult;
use crate::store::OrderRepository;

/// Consumer loop for `OrderStatusUpdatedEvent`s on the payments topic
pub struct StatusWorker {
    consumer: EventConsumer,
    orders: Arc<dyn OrderRepository>,
}

impl StatusWorker {
    pub fn new(consumer: EventConsumer, orders: Arc<dyn OrderRepository>) -> Self {
        Self { consumer, orders }
    }

    /// Run the worker loop
    ///
    /// Returns when shutdown is signaled via the cancellation token.
    pub async fn run(self, shutdown: tokio_util::sync::CancellationToken) {
        info!("Status worker started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Status worker shutdown requested");
                    break;
                }
                result = self.consumer.recv() => {
                    match result {
                        Ok(message) => {
                            if let Err(e) = self.handle(&message).await {
                                // Offset not committed: the broker will redeliver
                                error!(error = %e, "Failed to process status update (will retry)");
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "Consumer error");
                        }
                    }
                }
            }
        }

        info!("Status worker stopped");
    }

    async fn handle(&self, message: &BorrowedMessage<'_>) -> OrderdResult<()> {
        let event: OrderStatusUpdatedEvent = match EventConsumer::decode(message) {
            Ok(event) => event,
            Err(e) => {
                // Malformed payloads are dropped, not retried
                warn!(error = %e, "Dropping undecodable status update");
                self.consumer.commit(message)?;
                return Ok(());
            }
        };

        apply_status_update(self.orders.as_ref(), &event).await?;
        self.consumer.commit(message)?;
        Ok(())
    }
}

/// Apply one status update to the order store
///
/// Malformed order ids and unknown status values are logged and dropped
/// (the caller still advances the offset). Database errors propagate so
/// the event is redelivered.
pub async fn apply_status_update(
    orders: &dyn OrderRepository,
    event: &OrderStatusUpdatedEvent,
) -> OrderdResult<()> {
    let order_id = match Uuid::parse_str(&event.order_id) {
        Ok(id) => id,
        Err(_) => {
            warn!(order_id = %event.order_id, "Dropping status update with invalid order id");
            return Ok(());
        }
    };

    let status = match OrderStatus::from_str(&event.status) {
        Ok(status) if status.is_terminal() => status,
        _ => {
            warn!(status = %event.status, "Dropping status update with unknown status");
            return Ok(());
        }
    };

    let updated = orders.finish_or_cancel(order_id, status).await?;

    if updated == 0 {
        debug!(%order_id, %status, "Order missing or already terminal; nothing to update");
    } else {
        info!(
            %order_id,
            %status,
            reason = event.reason.as_deref().unwrap_or(""),
            "Order status updated"
        );
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryOrderStore, OrderRepository};
    use merx_domain::{Amount, Order, PricedItem};
    use merx_messaging::OutboxMessage;
    use rust_decimal_macros::dec;

    async fn store_with_new_order() -> (MemoryOrderStore, Uuid) {
        let store = MemoryOrderStore::new();
        let order = Order::new(
            "u1",
            vec![PricedItem {
                product_id: 1,
                product_name: "Widget".to_string(),
                quantity: 1,
                unit_price: Amount::new(dec!(25.0)).unwrap(),
            }],
        )
        .unwrap();
        let id = order.id;
        store
            .create_with_outbox(&order, &OutboxMessage::new("order_created", vec![]))
            .await
            .unwrap();
        (store, id)
    }

    fn status_event(order_id: &str, status: &str) -> OrderStatusUpdatedEvent {
        OrderStatusUpdatedEvent {
            order_id: order_id.to_string(),
            status: status.to_string(),
            reason: None,
        }
    }

    #[tokio::test]
    async fn test_finished_event_finalises_order() {
        let (store, id) = store_with_new_order().await;

        apply_status_update(&store, &status_event(&id.to_string(), "FINISHED"))
            .await
            .unwrap();

        let order = store.get(id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Finished);
    }

    #[tokio::test]
    async fn test_terminal_order_never_transitions_again() {
        let (store, id) = store_with_new_order().await;

        apply_status_update(&store, &status_event(&id.to_string(), "CANCELLED"))
            .await
            .unwrap();
        // A buggy upstream re-sends a different terminal status
        apply_status_update(&store, &status_event(&id.to_string(), "FINISHED"))
            .await
            .unwrap();

        let order = store.get(id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_invalid_order_id_is_dropped() {
        let (store, id) = store_with_new_order().await;

        apply_status_update(&store, &status_event("not-a-uuid", "FINISHED"))
            .await
            .unwrap();

        let order = store.get(id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::New);
    }

    #[tokio::test]
    async fn test_unknown_status_is_a_no_op() {
        let (store, id) = store_with_new_order().await;

        apply_status_update(&store, &status_event(&id.to_string(), "SHIPPED"))
            .await
            .unwrap();

        let order = store.get(id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::New);
    }

    #[tokio::test]
    async fn test_new_is_not_accepted_as_update_target() {
        let (store, id) = store_with_new_order().await;

        // "NEW" parses as a status but is not terminal; must be dropped
        apply_status_update(&store, &status_event(&id.to_string(), "NEW"))
            .await
            .unwrap();

        let order = store.get(id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::New);
    }
}
