//! Order service persistence.
//!
//! Repository traits with PostgreSQL implementations, plus in-memory
//! implementations for tests. The create path is the transactional heart
//! of the order side: order, items, and outbox row commit together or not
//! at all.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::str::FromStr;
use uuid::Uuid;

use merx_domain::{Amount, Order, OrderItem, OrderStatus, Product};
use merx_messaging::{outbox, OutboxMessage};

use crate::error::OrderdResult;

// =============================================================================
// Repository Traits
// =============================================================================

/// Repository for Order entities
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist an order, its items, and the outbox intent in one transaction
    async fn create_with_outbox(
        &self,
        order: &Order,
        message: &OutboxMessage,
    ) -> OrderdResult<()>;

    /// Find an order (with items) by id
    async fn get(&self, id: Uuid) -> OrderdResult<Option<Order>>;

    /// Find all orders for a user, newest first
    async fn list_by_user(&self, user_id: &str) -> OrderdResult<Vec<Order>>;

    /// Move a NEW order to a terminal status
    ///
    /// Guarded by `WHERE status = 'NEW'` so terminal orders never
    /// transition again. Returns the number of rows updated (0 when the
    /// order is missing or already terminal).
    async fn finish_or_cancel(&self, id: Uuid, status: OrderStatus) -> OrderdResult<u64>;
}

/// Repository for the product catalog
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Fetch products by id
    async fn get_by_ids(&self, ids: &[i64]) -> OrderdResult<Vec<Product>>;

    /// List the catalog
    async fn list(&self) -> OrderdResult<Vec<Product>>;
}

// =============================================================================
// PostgreSQL Implementations
// =============================================================================

/// PostgreSQL-backed order repository
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn items_for(&self, order_id: Uuid) -> OrderdResult<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, quantity, price
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let price: Decimal = row.try_get("price")?;
            items.push(OrderItem {
                product_id: row.try_get("product_id")?,
                quantity: row.try_get("quantity")?,
                unit_price: Amount::new(price)?,
            });
        }

        Ok(items)
    }
}

fn row_to_order(row: &PgRow, items: Vec<OrderItem>) -> OrderdResult<Order> {
    let status: String = row.try_get("status")?;
    let total: Decimal = row.try_get("total_amount")?;

    Ok(Order {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        items,
        total_amount: Amount::new(total)?,
        description: row.try_get("description")?,
        status: OrderStatus::from_str(&status)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

#[async_trait]
impl OrderRepository for PgOrderStore {
    async fn create_with_outbox(
        &self,
        order: &Order,
        message: &OutboxMessage,
    ) -> OrderdResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, status, total_amount, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id)
        .bind(&order.user_id)
        .bind(order.status.as_str())
        .bind(order.total_amount.as_decimal())
        .bind(&order.description)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, price)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price.as_decimal())
            .execute(&mut *tx)
            .await?;
        }

        outbox::enqueue(&mut tx, message).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> OrderdResult<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, status, total_amount, description, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let items = self.items_for(id).await?;
                Ok(Some(row_to_order(&row, items)?))
            }
            None => Ok(None),
        }
    }

    async fn list_by_user(&self, user_id: &str) -> OrderdResult<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, status, total_amount, description, created_at, updated_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row.try_get("id")?;
            let items = self.items_for(id).await?;
            orders.push(row_to_order(&row, items)?);
        }

        Ok(orders)
    }

    async fn finish_or_cancel(&self, id: Uuid, status: OrderStatus) -> OrderdResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status = 'NEW'
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// PostgreSQL-backed product repository
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_product(row: &PgRow) -> OrderdResult<Product> {
    let price: Decimal = row.try_get("price")?;

    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        price: Amount::new(price)?,
    })
}

#[async_trait]
impl ProductRepository for PgProductStore {
    async fn get_by_ids(&self, ids: &[i64]) -> OrderdResult<Vec<Product>> {
        let rows = sqlx::query("SELECT id, name, price FROM products WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn list(&self) -> OrderdResult<Vec<Product>> {
        let rows = sqlx::query("SELECT id, name, price FROM products ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_product).collect()
    }
}

// =============================================================================
// In-Memory Implementations (for tests)
// =============================================================================

/// In-memory order repository
///
/// Captures the outbox messages the create path would have committed, so
/// tests can assert on the publish intent.
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: std::sync::Mutex<Vec<Order>>,
    outbox: std::sync::Mutex<Vec<OutboxMessage>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outbox messages recorded so far
    pub fn outbox_messages(&self) -> Vec<OutboxMessage> {
        self.outbox.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderStore {
    async fn create_with_outbox(
        &self,
        order: &Order,
        message: &OutboxMessage,
    ) -> OrderdResult<()> {
        self.orders.lock().unwrap().push(order.clone());
        self.outbox.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> OrderdResult<Option<Order>> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    async fn list_by_user(&self, user_id: &str) -> OrderdResult<Vec<Order>> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn finish_or_cancel(&self, id: Uuid, status: OrderStatus) -> OrderdResult<u64> {
        let mut orders = self.orders.lock().unwrap();
        match orders
            .iter_mut()
            .find(|o| o.id == id && o.status == OrderStatus::New)
        {
            Some(order) => {
                order.status = status;
                order.updated_at = Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

/// In-memory product repository
pub struct MemoryProductStore {
    products: Vec<Product>,
}

impl MemoryProductStore {
    pub fn with_products(products: Vec<Product>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl ProductRepository for MemoryProductStore {
    async fn get_by_ids(&self, ids: &[i64]) -> OrderdResult<Vec<Product>> {
        Ok(self
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn list(&self) -> OrderdResult<Vec<Product>> {
        Ok(self.products.clone())
    }
}
