//! Order saga coordinator.
//!
//! Accepts create-order commands, prices them against the catalog, and
//! persists order + outbox intent atomically. There is no compensating
//! action on the caller path: after commit the outbox row exists, before
//! commit nothing happened.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use merx_domain::{Order, OrderCreatedEvent, PricedItem, Product, ORDER_CREATED};
use merx_messaging::OutboxMessage;

use crate::error::{OrderdError, OrderdResult};
use crate::store::{OrderRepository, ProductRepository};

// =============================================================================
// Commands
// =============================================================================

/// Command to create an order
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderCommand {
    pub user_id: String,
    pub items: Vec<CreateOrderItem>,
}

/// One requested line of a create-order command
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderItem {
    pub product_id: i64,
    pub quantity: i32,
}

// =============================================================================
// Order Service
// =============================================================================

/// Coordinates order creation and queries
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    products: Arc<dyn ProductRepository>,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self { orders, products }
    }

    /// Create a new order
    ///
    /// Validates the command, captures current catalog prices, and commits
    /// order + items + outbox row in a single transaction.
    pub async fn create_order(&self, command: CreateOrderCommand) -> OrderdResult<Order> {
        if command.items.is_empty() {
            return Err(OrderdError::InvalidCommand(
                "order must contain at least one item".to_string(),
            ));
        }

        let product_ids: Vec<i64> = command.items.iter().map(|i| i.product_id).collect();
        let products = self.products.get_by_ids(&product_ids).await?;
        let by_id: HashMap<i64, &Product> = products.iter().map(|p| (p.id, p)).collect();

        let mut priced = Vec::with_capacity(command.items.len());
        for item in &command.items {
            let product = by_id.get(&item.product_id).ok_or_else(|| {
                OrderdError::InvalidCommand("one or more products not found".to_string())
            })?;

            priced.push(PricedItem {
                product_id: product.id,
                product_name: product.name.clone(),
                quantity: item.quantity,
                unit_price: product.price,
            });
        }

        let order = Order::new(command.user_id.as_str(), priced)?;

        let event = OrderCreatedEvent {
            order_id: order.id,
            user_id: order.user_id.clone(),
            total_amount: order.total_amount.as_decimal(),
        };
        let payload = serde_json::to_vec(&event)?;
        let message = OutboxMessage::new(ORDER_CREATED, payload);

        self.orders.create_with_outbox(&order, &message).await?;

        info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total_amount = %order.total_amount,
            "Order created"
        );

        Ok(order)
    }

    /// Retrieve an order by id
    pub async fn get_order(&self, id: Uuid) -> OrderdResult<Option<Order>> {
        self.orders.get(id).await
    }

    /// Retrieve all orders for a user
    pub async fn list_user_orders(&self, user_id: &str) -> OrderdResult<Vec<Order>> {
        self.orders.list_by_user(user_id).await
    }

    /// List the product catalog
    pub async fn list_products(&self) -> OrderdResult<Vec<Product>> {
        self.products.list().await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryOrderStore, MemoryProductStore};
    use merx_domain::Amount;
    use rust_decimal_macros::dec;

    fn catalog() -> Vec<Product> {
        vec![
            Product {
                id: 1,
                name: "Widget".to_string(),
                price: Amount::new(dec!(25.0)).unwrap(),
            },
            Product {
                id: 2,
                name: "Gadget".to_string(),
                price: Amount::new(dec!(9.99)).unwrap(),
            },
        ]
    }

    fn service_with_catalog() -> (OrderService, Arc<MemoryOrderStore>) {
        let orders = Arc::new(MemoryOrderStore::new());
        let products = Arc::new(MemoryProductStore::with_products(catalog()));
        (
            OrderService::new(orders.clone(), products),
            orders,
        )
    }

    #[tokio::test]
    async fn test_create_order_happy_path() {
        let (service, orders) = service_with_catalog();

        let order = service
            .create_order(CreateOrderCommand {
                user_id: "u1".to_string(),
                items: vec![CreateOrderItem {
                    product_id: 1,
                    quantity: 2,
                }],
            })
            .await
            .unwrap();

        assert_eq!(order.total_amount.as_decimal(), dec!(50.0));
        assert_eq!(order.status, merx_domain::OrderStatus::New);

        // Exactly one publish intent, carrying the order-created payload
        let messages = orders.outbox_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_type, ORDER_CREATED);

        let event: OrderCreatedEvent = serde_json::from_slice(&messages[0].payload).unwrap();
        assert_eq!(event.order_id, order.id);
        assert_eq!(event.user_id, "u1");
        assert_eq!(event.total_amount, dec!(50.0));
    }

    #[tokio::test]
    async fn test_create_order_rejects_empty_items() {
        let (service, _) = service_with_catalog();

        let result = service
            .create_order(CreateOrderCommand {
                user_id: "u1".to_string(),
                items: vec![],
            })
            .await;

        assert!(matches!(result, Err(OrderdError::InvalidCommand(_))));
    }

    #[tokio::test]
    async fn test_create_order_rejects_unknown_product() {
        let (service, orders) = service_with_catalog();

        let result = service
            .create_order(CreateOrderCommand {
                user_id: "u1".to_string(),
                items: vec![CreateOrderItem {
                    product_id: 99,
                    quantity: 1,
                }],
            })
            .await;

        assert!(matches!(result, Err(OrderdError::InvalidCommand(_))));
        assert!(orders.outbox_messages().is_empty());
    }

    #[tokio::test]
    async fn test_create_order_prices_each_line_at_order_time() {
        let (service, _) = service_with_catalog();

        let order = service
            .create_order(CreateOrderCommand {
                user_id: "u1".to_string(),
                items: vec![
                    CreateOrderItem {
                        product_id: 1,
                        quantity: 2,
                    },
                    CreateOrderItem {
                        product_id: 2,
                        quantity: 3,
                    },
                ],
            })
            .await
            .unwrap();

        assert_eq!(order.total_amount.as_decimal(), dec!(79.97));
        assert_eq!(
            order.description,
            "Order with items: Widget (x2), Gadget (x3)"
        );
        assert_eq!(order.items[1].unit_price.as_decimal(), dec!(9.99));
    }

    #[tokio::test]
    async fn test_get_missing_order_is_none() {
        let (service, _) = service_with_catalog();
        assert!(service.get_order(Uuid::new_v4()).await.unwrap().is_none());
    }
}
