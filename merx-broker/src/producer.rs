//! Kafka producer bound to one topic.
//!
//! Message key is the 16 raw bytes of the outbox message id: stable per
//! message across republications, so downstream compaction and partition
//! placement see one key per logical message.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord};
use tracing::{debug, info};

use crate::config::BrokerConfig;
use crate::error::BrokerError;
use merx_messaging::{MessagingError, OutboxMessage, OutboxPublisher};

/// Producer for one logical topic
pub struct EventProducer {
    producer: FutureProducer,
    topic: String,
}

impl EventProducer {
    /// Connect a producer for the given topic
    pub fn new(config: &BrokerConfig, topic: impl Into<String>) -> Result<Self, BrokerError> {
        let topic = topic.into();
        let producer: FutureProducer = config
            .producer_config()
            .create()
            .map_err(|e| BrokerError::Connection(format!("Failed to create producer: {}", e)))?;

        info!(brokers = %config.brokers, topic = %topic, "Connected Kafka producer");

        Ok(Self { producer, topic })
    }

    /// Publish one message and wait for broker acknowledgement
    pub async fn send(&self, key: &[u8], payload: &[u8]) -> Result<(), BrokerError> {
        let record = FutureRecord::to(&self.topic).key(key).payload(payload);

        self.producer
            .send(record, Duration::from_secs(5))
            .await
            .map_err(|(e, _)| BrokerError::Publish(format!("Failed to publish: {}", e)))?;

        debug!(topic = %self.topic, "Published message");

        Ok(())
    }
}

#[async_trait]
impl OutboxPublisher for EventProducer {
    async fn publish(&self, message: &OutboxMessage) -> merx_messaging::Result<()> {
        self.send(message.id.as_bytes(), &message.payload)
            .await
            .map_err(|e| MessagingError::Publish(e.to_string()))
    }
}
