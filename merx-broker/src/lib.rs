//! Merx Broker Adapters
//!
//! Typed Kafka access for the two logical topics:
//! - `orders` carries `OrderCreatedEvent` (produced by the order service,
//!   consumed by the payment service)
//! - `payments` carries `OrderStatusUpdatedEvent` (produced by the payment
//!   service, consumed by the order service)
//!
//! The producer implements [`merx_messaging::OutboxPublisher`], so the
//! outbox dispatcher publishes through it directly.

pub mod config;
pub mod consumer;
pub mod error;
pub mod producer;

pub use config::{BrokerConfig, ORDERS_TOPIC, PAYMENTS_TOPIC};
pub use consumer::EventConsumer;
pub use error::BrokerError;
pub use producer::EventProducer;

// Re-exported so worker loops can name received messages without a
// direct rdkafka dependency.
pub use rdkafka::message::BorrowedMessage;
