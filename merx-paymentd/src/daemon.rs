//! Daemon: payment service runtime orchestrator.
//!
//! Ties together all components:
//! - HTTP API (accounts, users)
//! - Order worker (`orders` topic -> payment saga)
//! - Outbox dispatcher (pending rows -> `payments` topic)
//!
//! # Lifecycle
//!
//! 1. Connect database, run migrations
//! 2. Connect broker producer and consumer
//! 3. Spawn dispatcher + order worker + API server
//! 4. On SIGINT, cancel all loops and drain with a bounded grace period

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use merx_broker::{BrokerConfig, EventConsumer, EventProducer, ORDERS_TOPIC, PAYMENTS_TOPIC};
use merx_messaging::OutboxDispatcher;

use crate::accounts::AccountService;
use crate::api::create_router;
use crate::config::PaymentdConfig;
use crate::error::{PaymentdError, PaymentdResult};
use crate::order_worker::OrderWorker;
use crate::saga::PaymentSaga;
use crate::store::{PgAccountStore, PgUserStore};
use crate::MIGRATOR;

/// Grace period for in-flight work during shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The payment service daemon.
pub struct Daemon {
    config: PaymentdConfig,
}

impl Daemon {
    pub fn new(config: PaymentdConfig) -> Self {
        Self { config }
    }

    /// Run the daemon.
    ///
    /// This method blocks until shutdown is requested (SIGINT).
    pub async fn run(self) -> PaymentdResult<()> {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            "Starting payment service"
        );

        // 1. Database
        let pool = merx_db::connect(&self.config.database_url)
            .await
            .map_err(|e| PaymentdError::Startup(format!("database connect failed: {}", e)))?;
        merx_db::run_migrations(&pool, &MIGRATOR)
            .await
            .map_err(|e| PaymentdError::Startup(format!("migrations failed: {}", e)))?;

        // 2. Broker
        let producer = EventProducer::new(
            &BrokerConfig::publisher(&self.config.kafka.brokers),
            PAYMENTS_TOPIC,
        )?;
        let consumer = EventConsumer::new(
            &BrokerConfig::subscriber(&self.config.kafka.brokers, &self.config.kafka.group_id),
            ORDERS_TOPIC,
        )?;

        // 3. Services
        let accounts = Arc::new(PgAccountStore::new(pool.clone()));
        let users = Arc::new(PgUserStore::new(pool.clone()));
        let account_service = AccountService::new(accounts, users);
        let saga = PaymentSaga::new(pool.clone());

        // 4. Workers
        let shutdown = CancellationToken::new();

        let dispatcher =
            OutboxDispatcher::new(pool.clone(), producer, self.config.dispatcher.clone());
        let dispatcher_handle = tokio::spawn(dispatcher.run(shutdown.clone()));

        let order_worker = OrderWorker::new(consumer, saga);
        let worker_handle = tokio::spawn(order_worker.run(shutdown.clone()));

        // 5. API server
        let addr = format!("{}:{}", self.config.api.host, self.config.api.port);
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        info!(api_addr = %local_addr, "API server started");

        let router = create_router(account_service);
        let server_shutdown = shutdown.clone();
        let server_handle = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
                .await;

            if let Err(e) = result {
                error!(error = %e, "API server error");
            }
        });

        // 6. Wait for shutdown signal
        tokio::signal::ctrl_c().await?;
        info!("Received shutdown signal");
        shutdown.cancel();

        let drain = async {
            let _ = worker_handle.await;
            let _ = dispatcher_handle.await;
            let _ = server_handle.await;
        };
        if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
            error!("Shutdown grace period expired, aborting remaining tasks");
        }

        info!("Shutdown complete");
        Ok(())
    }
}
