//! Payment saga: the single transaction that ties event receipt, balance
//! debit, and outcome intent together.
//!
//! For each `OrderCreatedEvent` the saga runs one database transaction:
//!
//! 1. Record the event in the inbox under a deterministic id. A
//!    primary-key conflict means a prior delivery already applied the
//!    effect; the transaction aborts and the caller just advances the
//!    broker offset.
//! 2. Lock the account row (`FOR UPDATE`). Absent account or insufficient
//!    balance produce a CANCELLED outcome; otherwise the balance is
//!    debited under the lock and the outcome is FINISHED.
//! 3. The outcome travels through the outbox (it is cross-service state),
//!    the inbox row flips to processed, and everything commits together.
//!
//! Any infrastructure failure rolls the whole transaction back and leaves
//! the offset uncommitted, so the broker redelivers and step 1 makes the
//! retry idempotent.

use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use merx_domain::{
    OrderCreatedEvent, OrderStatus, OrderStatusUpdatedEvent, ORDER_CREATED, ORDER_STATUS_UPDATED,
};
use merx_messaging::{inbox, outbox, InboxMessage, MessagingError, OutboxMessage};

use crate::error::PaymentdResult;

/// Outcome reasons carried on the status event
pub const REASON_PAYMENT_SUCCESSFUL: &str = "Payment successful";
pub const REASON_ACCOUNT_NOT_FOUND: &str = "Account not found";
pub const REASON_INSUFFICIENT_BALANCE: &str = "Insufficient balance";

/// Result of processing one order-created event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SagaOutcome {
    /// The event was applied in this call
    Applied {
        status: OrderStatus,
        reason: &'static str,
    },
    /// The event was already applied on a prior delivery; nothing changed
    Duplicate,
}

/// Payment saga coordinator
pub struct PaymentSaga {
    pool: PgPool,
}

impl PaymentSaga {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Process one `OrderCreatedEvent` with effectively-once semantics
    pub async fn process_order_created(
        &self,
        event: &OrderCreatedEvent,
    ) -> PaymentdResult<SagaOutcome> {
        let inbox_id = inbox::message_id(ORDER_CREATED, event.order_id);
        let inbox_message =
            InboxMessage::new(inbox_id, ORDER_CREATED, serde_json::to_vec(event)?);

        let mut tx = self.pool.begin().await?;

        match inbox::record(&mut tx, &inbox_message).await {
            Ok(()) => {}
            Err(MessagingError::DuplicateMessage(_)) => {
                debug!(
                    order_id = %event.order_id,
                    "Duplicate order-created event; effect already applied"
                );
                return Ok(SagaOutcome::Duplicate);
            }
            Err(e) => return Err(e.into()),
        }

        // The account row is the per-user serialisation point: hold it
        // exclusively for the rest of the transaction.
        let row = sqlx::query("SELECT balance FROM accounts WHERE user_id = $1 FOR UPDATE")
            .bind(&event.user_id)
            .fetch_optional(&mut *tx)
            .await?;

        let (status, reason) = match row {
            None => (OrderStatus::Cancelled, REASON_ACCOUNT_NOT_FOUND),
            Some(row) => {
                let balance: Decimal = row.try_get("balance")?;

                if balance < event.total_amount {
                    (OrderStatus::Cancelled, REASON_INSUFFICIENT_BALANCE)
                } else {
                    sqlx::query(
                        r#"
                        UPDATE accounts
                        SET balance = balance - $1, updated_at = NOW()
                        WHERE user_id = $2
                        "#,
                    )
                    .bind(event.total_amount)
                    .bind(&event.user_id)
                    .execute(&mut *tx)
                    .await?;

                    (OrderStatus::Finished, REASON_PAYMENT_SUCCESSFUL)
                }
            }
        };

        // The outcome is cross-service state, so it travels through the
        // durable channel even on the cancellation paths.
        let outcome = OrderStatusUpdatedEvent {
            order_id: event.order_id.to_string(),
            status: status.as_str().to_string(),
            reason: Some(reason.to_string()),
        };
        let outbox_message =
            OutboxMessage::new(ORDER_STATUS_UPDATED, serde_json::to_vec(&outcome)?);
        outbox::enqueue(&mut tx, &outbox_message).await?;

        inbox::mark_processed(&mut tx, inbox_id).await?;

        tx.commit().await?;

        info!(
            order_id = %event.order_id,
            user_id = %event.user_id,
            total_amount = %event.total_amount,
            status = %status,
            reason,
            "Order payment processed"
        );

        Ok(SagaOutcome::Applied { status, reason })
    }
}
