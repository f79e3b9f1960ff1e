//! Test helper functions for database seeding and inspection.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::Result;

/// Seed a catalog product (order service schema).
///
/// Uses INSERT ... ON CONFLICT for idempotency.
pub async fn seed_product(pool: &PgPool, id: i64, name: &str, price: Decimal) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO products (id, name, price)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO UPDATE SET name = $2, price = $3
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(price)
    .execute(pool)
    .await?;

    Ok(())
}

/// Seed an account with the given balance (payment service schema).
///
/// Returns the account id.
pub async fn seed_account(pool: &PgPool, user_id: &str, balance: Decimal) -> Result<Uuid> {
    let account_id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO accounts (id, user_id, balance, created_at, updated_at)
        VALUES ($1, $2, $3, NOW(), NOW())
        ON CONFLICT (user_id) DO UPDATE SET balance = $3, updated_at = NOW()
        "#,
    )
    .bind(account_id)
    .bind(user_id)
    .bind(balance)
    .execute(pool)
    .await?;

    Ok(account_id)
}

/// Seed a user (payment service schema).
pub async fn seed_user(pool: &PgPool, name: &str) -> Result<Uuid> {
    let user_id = Uuid::new_v4();

    sqlx::query("INSERT INTO users (id, name, created_at) VALUES ($1, $2, NOW())")
        .bind(user_id)
        .bind(name)
        .execute(pool)
        .await?;

    Ok(user_id)
}

/// Insert an order row in status NEW (order service schema).
pub async fn seed_order(
    pool: &PgPool,
    order_id: Uuid,
    user_id: &str,
    total_amount: Decimal,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (id, user_id, status, total_amount, description, created_at, updated_at)
        VALUES ($1, $2, 'NEW', $3, '', NOW(), NOW())
        "#,
    )
    .bind(order_id)
    .bind(user_id)
    .bind(total_amount)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert a pending outbox row directly.
///
/// `created_at` is explicit so tests can pin dispatch order.
pub async fn seed_outbox_message(
    pool: &PgPool,
    id: Uuid,
    message_type: &str,
    payload: &[u8],
    created_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO outbox_messages (id, type, payload, status, created_at, updated_at)
        VALUES ($1, $2, $3, 'pending', $4, $4)
        "#,
    )
    .bind(id)
    .bind(message_type)
    .bind(payload)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Read an order's current status string.
pub async fn order_status(pool: &PgPool, order_id: Uuid) -> Result<String> {
    let status: String = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_one(pool)
        .await?;

    Ok(status)
}

/// Read an account's current balance.
pub async fn account_balance(pool: &PgPool, user_id: &str) -> Result<Decimal> {
    let balance: Decimal =
        sqlx::query_scalar("SELECT balance FROM accounts WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

    Ok(balance)
}

/// List `(id, type, status, payload)` of all outbox rows, oldest first.
pub async fn outbox_rows(pool: &PgPool) -> Result<Vec<(Uuid, String, String, Vec<u8>)>> {
    let rows = sqlx::query(
        r#"
        SELECT id, type, status, payload
        FROM outbox_messages
        ORDER BY created_at ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut result = Vec::with_capacity(rows.len());
    for row in rows {
        result.push((
            row.try_get("id")?,
            row.try_get("type")?,
            row.try_get("status")?,
            row.try_get("payload")?,
        ));
    }

    Ok(result)
}

/// Count inbox rows by status (payment service schema).
pub async fn inbox_count(pool: &PgPool, status: &str) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM inbox_messages WHERE status = $1")
            .bind(status)
            .fetch_one(pool)
            .await?;

    Ok(count)
}
