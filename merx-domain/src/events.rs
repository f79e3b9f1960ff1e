//! Cross-service wire events.
//!
//! These payloads travel through the durable outbox/inbox channel and the
//! broker. Field names are part of the wire contract; amounts are exact
//! decimals serialised as JSON numbers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outbox/inbox type tag for order creation events
pub const ORDER_CREATED: &str = "order_created";

/// Outbox type tag for order status updates
pub const ORDER_STATUS_UPDATED: &str = "order_status_updated";

/// Published by the order service when a new order is committed
///
/// Travels on the `orders` topic; consumed by the payment saga.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order_id: Uuid,
    pub user_id: String,
    pub total_amount: Decimal,
}

/// Published by the payment service with the payment outcome
///
/// Travels on the `payments` topic; consumed by the order service's
/// status-reconciliation worker. `status` is the textual order status
/// ("FINISHED" or "CANCELLED"); unknown values are dropped by consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusUpdatedEvent {
    pub order_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_created_event_wire_shape() {
        let event = OrderCreatedEvent {
            order_id: Uuid::nil(),
            user_id: "u1".to_string(),
            total_amount: dec!(50.0),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value["order_id"],
            "00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(value["user_id"], "u1");
        // Exact decimal, carried as a JSON number
        assert!(value["total_amount"].is_number());

        let back: OrderCreatedEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back.total_amount, dec!(50.0));
    }

    #[test]
    fn test_status_event_omits_absent_reason() {
        let event = OrderStatusUpdatedEvent {
            order_id: Uuid::nil().to_string(),
            status: "FINISHED".to_string(),
            reason: None,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("reason"));
    }

    #[test]
    fn test_status_event_round_trip_with_reason() {
        let event = OrderStatusUpdatedEvent {
            order_id: Uuid::new_v4().to_string(),
            status: "CANCELLED".to_string(),
            reason: Some("Insufficient balance".to_string()),
        };

        let json = serde_json::to_vec(&event).unwrap();
        let back: OrderStatusUpdatedEvent = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_total_amount_survives_exactly() {
        // 0.1 + 0.2 style values must not drift through serialisation
        let event = OrderCreatedEvent {
            order_id: Uuid::new_v4(),
            user_id: "u1".to_string(),
            total_amount: dec!(0.30),
        };

        let bytes = serde_json::to_vec(&event).unwrap();
        let back: OrderCreatedEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back.total_amount, dec!(0.30));
    }
}
