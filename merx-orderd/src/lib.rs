//! Merx Order Service
//!
//! Accepts create-order commands over HTTP, persists order + outbox intent
//! atomically, and reconciles order status from payment outcomes.
//!
//! # Architecture
//!
//! ```text
//! client -> API -> OrderService -> DB (orders + order_items + outbox)
//!                                      |
//!                              Outbox Dispatcher -> broker "orders" topic
//!
//! broker "payments" topic -> Status Worker -> DB (orders.status, guarded)
//! ```
//!
//! # Components
//!
//! - **Daemon**: runtime orchestrator (API server, dispatcher, worker)
//! - **OrderService**: order saga coordinator
//! - **StatusWorker**: payments-topic consumer
//! - **Stores**: repository traits with Postgres and in-memory impls

#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod daemon;
pub mod error;
pub mod service;
pub mod status_worker;
pub mod store;

/// Embedded migrations for the order service schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

// Re-exports for convenience
pub use config::{ApiConfig, KafkaConfig, OrderdConfig};
pub use daemon::Daemon;
pub use error::{OrderdError, OrderdResult};
pub use service::{CreateOrderCommand, CreateOrderItem, OrderService};
pub use status_worker::StatusWorker;
