//! Order entities.
//!
//! An order is created in status NEW together with its outbox intent,
//! and is moved to a terminal status only by the status-reconciliation
//! consumer. Transitions are monotone: NEW -> FINISHED | CANCELLED.

use crate::money::{Amount, DomainError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for an Order
pub type OrderId = Uuid;

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Created, payment outcome not yet known
    #[serde(rename = "NEW")]
    New,
    /// Payment succeeded
    #[serde(rename = "FINISHED")]
    Finished,
    /// Payment rejected (no account, insufficient balance)
    #[serde(rename = "CANCELLED")]
    Cancelled,
}

impl OrderStatus {
    /// Database / wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Finished => "FINISHED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Terminal statuses admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Finished | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(OrderStatus::New),
            "FINISHED" => Ok(OrderStatus::Finished),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A customer's request to purchase items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub total_amount: Amount,
    pub description: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Compose a new order in status NEW
    ///
    /// The total is computed from the items; the description lists each
    /// item's product name and quantity.
    ///
    /// # Errors
    /// Returns `DomainError::EmptyOrder` if `items` is empty.
    pub fn new(user_id: impl Into<String>, items: Vec<PricedItem>) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(DomainError::EmptyOrder);
        }

        let mut total = Amount::zero();
        let mut description = String::from("Order with items: ");
        let mut order_items = Vec::with_capacity(items.len());

        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                description.push_str(", ");
            }
            description.push_str(&format!("{} (x{})", item.product_name, item.quantity));

            let order_item = OrderItem::new(item.product_id, item.quantity, item.unit_price)?;
            total = total.plus(order_item.line_total());
            order_items.push(order_item);
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            items: order_items,
            total_amount: total,
            description,
            status: OrderStatus::New,
            created_at: now,
            updated_at: now,
        })
    }
}

/// An item resolved against the catalog, ready to be priced into an order
#[derive(Debug, Clone)]
pub struct PricedItem {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Amount,
}

// =============================================================================
// Order Item
// =============================================================================

/// Line item of an order, priced at order time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Amount,
}

impl OrderItem {
    /// Create a line item with a positive quantity
    pub fn new(product_id: i64, quantity: i32, unit_price: Amount) -> Result<Self, DomainError> {
        if quantity <= 0 {
            return Err(DomainError::InvalidQuantity(format!(
                "quantity must be positive, got {}",
                quantity
            )));
        }
        Ok(Self {
            product_id,
            quantity,
            unit_price,
        })
    }

    /// quantity x unit_price
    pub fn line_total(&self) -> Amount {
        // Non-negative by construction: quantity > 0 and unit_price >= 0.
        Amount::new(self.unit_price.as_decimal() * rust_decimal::Decimal::from(self.quantity))
            .unwrap_or_else(|_| Amount::zero())
    }
}

// =============================================================================
// Product
// =============================================================================

/// Catalog product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: Amount,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn priced(product_id: i64, name: &str, quantity: i32, price: &str) -> PricedItem {
        PricedItem {
            product_id,
            product_name: name.to_string(),
            quantity,
            unit_price: Amount::new(price.parse().unwrap()).unwrap(),
        }
    }

    #[test]
    fn test_order_total_is_sum_of_line_totals() {
        let order = Order::new(
            "u1",
            vec![priced(1, "Widget", 2, "25.0"), priced(2, "Gadget", 1, "9.99")],
        )
        .unwrap();

        assert_eq!(order.total_amount.as_decimal(), dec!(59.99));
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.items.len(), 2);
    }

    #[test]
    fn test_order_description_lists_items() {
        let order = Order::new(
            "u1",
            vec![priced(1, "Widget", 2, "25.0"), priced(2, "Gadget", 1, "9.99")],
        )
        .unwrap();

        assert_eq!(
            order.description,
            "Order with items: Widget (x2), Gadget (x1)"
        );
    }

    #[test]
    fn test_order_rejects_empty_items() {
        assert!(matches!(
            Order::new("u1", vec![]),
            Err(DomainError::EmptyOrder)
        ));
    }

    #[test]
    fn test_order_item_rejects_non_positive_quantity() {
        let price = Amount::new(dec!(10)).unwrap();
        assert!(OrderItem::new(1, 0, price).is_err());
        assert!(OrderItem::new(1, -3, price).is_err());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            OrderStatus::New,
            OrderStatus::Finished,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("PAID".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::New.is_terminal());
        assert!(OrderStatus::Finished.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }
}
