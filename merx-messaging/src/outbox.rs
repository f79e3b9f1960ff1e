//! Outbox persistence.
//!
//! The enqueue runs inside the caller's open transaction so that the
//! publish intent commits atomically with the state change it describes.
//! The dispatcher later drains pending rows in created-at order.

use crate::types::{MessageStatus, MessagingError, OutboxMessage, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

/// Insert an outbox message within an existing transaction
///
/// Use this from saga coordinators: the row must land in the same
/// transaction as the order/account mutation.
pub async fn enqueue(
    tx: &mut Transaction<'_, Postgres>,
    message: &OutboxMessage,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO outbox_messages (id, type, payload, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(message.id)
    .bind(&message.message_type)
    .bind(&message.payload)
    .bind(message.status.as_str())
    .bind(message.created_at)
    .bind(message.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Fetch pending messages, oldest first
///
/// FIFO per row creation time; ties broken arbitrarily.
pub async fn fetch_pending(pool: &PgPool, limit: i64) -> Result<Vec<OutboxMessage>> {
    let rows = sqlx::query(
        r#"
        SELECT id, type, payload, status, created_at, updated_at
        FROM outbox_messages
        WHERE status = 'pending'
        ORDER BY created_at ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_message).collect()
}

/// Mark a message processed after successful publication
pub async fn mark_processed(pool: &PgPool, id: Uuid) -> Result<()> {
    sqlx::query(
        "UPDATE outbox_messages SET status = 'processed', updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

fn row_to_message(row: &PgRow) -> Result<OutboxMessage> {
    let status: String = row.try_get("status").map_err(MessagingError::Database)?;

    Ok(OutboxMessage {
        id: row.try_get("id").map_err(MessagingError::Database)?,
        message_type: row.try_get("type").map_err(MessagingError::Database)?,
        payload: row.try_get("payload").map_err(MessagingError::Database)?,
        status: MessageStatus::parse(&status)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(MessagingError::Database)?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(MessagingError::Database)?,
    })
}
