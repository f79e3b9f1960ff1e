//! Merx Payment Service
//!
//! Consumes order-created events, debits account balances with
//! effectively-once semantics via the transactional inbox, and reports
//! outcomes through the transactional outbox.
//!
//! # Architecture
//!
//! ```text
//! broker "orders" topic -> Order Worker -> Payment Saga
//!                                            |
//!                      one transaction: inbox + account debit + outbox
//!                                            |
//!                                 Outbox Dispatcher -> broker "payments" topic
//!
//! client -> API -> AccountService -> DB (accounts, users)
//! ```
//!
//! # Components
//!
//! - **Daemon**: runtime orchestrator (API server, dispatcher, worker)
//! - **PaymentSaga**: the inbox/debit/outbox transaction
//! - **OrderWorker**: orders-topic consumer
//! - **AccountService**: account/user lifecycle behind the HTTP boundary

#![warn(clippy::all)]

pub mod accounts;
pub mod api;
pub mod config;
pub mod daemon;
pub mod error;
pub mod order_worker;
pub mod saga;
pub mod store;

/// Embedded migrations for the payment service schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

// Re-exports for convenience
pub use accounts::AccountService;
pub use config::{ApiConfig, KafkaConfig, PaymentdConfig};
pub use daemon::Daemon;
pub use error::{PaymentdError, PaymentdResult};
pub use order_worker::OrderWorker;
pub use saga::{PaymentSaga, SagaOutcome};
