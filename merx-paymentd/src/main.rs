//! Merx Payment Service Daemon
//!
//! # Usage
//!
//! ```bash
//! DB_CONNECTION_STRING=postgresql://... KAFKA_BROKERS=localhost:9092 merx-paymentd
//! ```
//!
//! # Environment Variables
//!
//! - `DB_CONNECTION_STRING`: PostgreSQL connection string (required)
//! - `KAFKA_BROKERS`: Kafka bootstrap servers, comma-separated (required)
//! - `PORT`: API port (default: 8080)
//! - `MERX_API_HOST`: API host (default: 0.0.0.0)
//! - `MERX_OUTBOX_POLL_MS`: Outbox poll interval (default: 1000)
//! - `MERX_OUTBOX_BATCH_SIZE`: Outbox batch size (default: 10)

use merx_paymentd::{Daemon, PaymentdConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("merx_paymentd=info".parse()?))
        .init();

    let config = PaymentdConfig::from_env()?;

    let daemon = Daemon::new(config);
    daemon.run().await?;

    Ok(())
}
