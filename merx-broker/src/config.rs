//! Broker connection configuration.
//!
//! Producers are idempotent with full acknowledgement; consumers never
//! auto-commit. Offsets are committed by callers only after the effect of
//! a message is durable, which is what lets the broker redeliver after a
//! crash.

use rdkafka::ClientConfig;

/// Topic carrying `OrderCreatedEvent`s (order service -> payment service)
pub const ORDERS_TOPIC: &str = "orders";

/// Topic carrying `OrderStatusUpdatedEvent`s (payment service -> order service)
pub const PAYMENTS_TOPIC: &str = "payments";

/// Configuration for broker connections
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Bootstrap servers (comma-separated)
    pub brokers: String,
    /// Consumer group id (required for subscribing); stable across
    /// restarts so uncommitted offsets replay
    pub group_id: Option<String>,
}

impl BrokerConfig {
    /// Config for publishing only
    pub fn publisher(brokers: impl Into<String>) -> Self {
        Self {
            brokers: brokers.into(),
            group_id: None,
        }
    }

    /// Config for consuming under a stable group id
    pub fn subscriber(brokers: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            brokers: brokers.into(),
            group_id: Some(group_id.into()),
        }
    }

    /// Build a ClientConfig for producers
    pub(crate) fn producer_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", &self.brokers);
        config.set("message.timeout.ms", "5000");
        config.set("acks", "all");
        config.set("enable.idempotence", "true");
        config
    }

    /// Build a ClientConfig for consumers
    pub(crate) fn consumer_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", &self.brokers);
        config.set("enable.auto.commit", "false");
        config.set("auto.offset.reset", "earliest");

        if let Some(ref group_id) = self.group_id {
            config.set("group.id", group_id);
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_producer_config_is_idempotent() {
        let config = BrokerConfig::publisher("localhost:9092").producer_config();

        assert_eq!(config.get("acks"), Some("all"));
        assert_eq!(config.get("enable.idempotence"), Some("true"));
    }

    #[test]
    fn test_consumer_config_disables_auto_commit() {
        let config =
            BrokerConfig::subscriber("localhost:9092", "order-service").consumer_config();

        assert_eq!(config.get("enable.auto.commit"), Some("false"));
        assert_eq!(config.get("auto.offset.reset"), Some("earliest"));
        assert_eq!(config.get("group.id"), Some("order-service"));
    }
}
