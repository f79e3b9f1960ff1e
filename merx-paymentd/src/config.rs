//! Payment service configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{PaymentdError, PaymentdResult};
use merx_messaging::DispatcherConfig;
use std::env;

/// Payment service configuration.
#[derive(Debug, Clone)]
pub struct PaymentdConfig {
    /// API server configuration
    pub api: ApiConfig,

    /// Database connection string
    pub database_url: String,

    /// Broker configuration
    pub kafka: KafkaConfig,

    /// Outbox dispatcher tuning
    pub dispatcher: DispatcherConfig,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

/// Broker configuration.
#[derive(Debug, Clone)]
pub struct KafkaConfig {
    /// Bootstrap servers (comma-separated)
    pub brokers: String,
    /// Consumer group id, stable across restarts
    pub group_id: String,
}

impl PaymentdConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> PaymentdResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let database_url = env::var("DB_CONNECTION_STRING")
            .map_err(|_| PaymentdError::Config("DB_CONNECTION_STRING is not set".to_string()))?;

        let brokers = env::var("KAFKA_BROKERS")
            .map_err(|_| PaymentdError::Config("KAFKA_BROKERS is not set".to_string()))?;

        let host = env::var("MERX_API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = load_env_parsed("PORT", 8080)?;

        let dispatcher = DispatcherConfig {
            poll_interval_ms: load_env_parsed("MERX_OUTBOX_POLL_MS", 1000)?,
            batch_size: load_env_parsed("MERX_OUTBOX_BATCH_SIZE", 10)?,
        };

        Ok(Self {
            api: ApiConfig { host, port },
            database_url,
            kafka: KafkaConfig {
                brokers,
                group_id: "payment-service".to_string(),
            },
            dispatcher,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            database_url: "postgresql://localhost/merx_payments_test".to_string(),
            kafka: KafkaConfig {
                brokers: "localhost:9092".to_string(),
                group_id: "payment-service".to_string(),
            },
            dispatcher: DispatcherConfig {
                poll_interval_ms: 50,
                batch_size: 10,
            },
        }
    }
}

fn load_env_parsed<T: std::str::FromStr>(key: &str, default: T) -> PaymentdResult<T> {
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|_| PaymentdError::Config(format!("Invalid {} value: {}", key, val))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_config() {
        let config = PaymentdConfig::test();

        assert_eq!(config.api.port, 0);
        assert_eq!(config.kafka.group_id, "payment-service");
        assert_eq!(config.dispatcher.poll_interval_ms, 50);
    }
}
