//! Kafka consumer bound to one topic.
//!
//! Offsets are committed explicitly by the worker loops after the effect
//! of a message has been committed to the database. An uncommitted offset
//! is the redelivery mechanism.

use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::config::BrokerConfig;
use crate::error::BrokerError;

/// Consumer for one logical topic
pub struct EventConsumer {
    consumer: StreamConsumer,
    topic: String,
}

impl EventConsumer {
    /// Connect and subscribe to the given topic
    ///
    /// The config must carry a group id.
    pub fn new(config: &BrokerConfig, topic: impl Into<String>) -> Result<Self, BrokerError> {
        let topic = topic.into();

        if config.group_id.is_none() {
            return Err(BrokerError::Connection(
                "Consumer requires a group id; use BrokerConfig::subscriber".to_string(),
            ));
        }

        let consumer: StreamConsumer = config
            .consumer_config()
            .create()
            .map_err(|e| BrokerError::Connection(format!("Failed to create consumer: {}", e)))?;

        consumer
            .subscribe(&[&topic])
            .map_err(|e| BrokerError::Consume(format!("Failed to subscribe: {}", e)))?;

        info!(
            brokers = %config.brokers,
            topic = %topic,
            group_id = ?config.group_id,
            "Subscribed Kafka consumer"
        );

        Ok(Self { consumer, topic })
    }

    /// Await the next message
    pub async fn recv(&self) -> Result<BorrowedMessage<'_>, BrokerError> {
        self.consumer
            .recv()
            .await
            .map_err(|e| BrokerError::Consume(format!("Receive failed on {}: {}", self.topic, e)))
    }

    /// Decode a received message's JSON payload
    pub fn decode<T: DeserializeOwned>(message: &BorrowedMessage<'_>) -> Result<T, BrokerError> {
        let payload = message
            .payload()
            .ok_or_else(|| BrokerError::Consume("Message has no payload".to_string()))?;

        serde_json::from_slice(payload).map_err(BrokerError::Decode)
    }

    /// Commit the message's offset after its effect is durable
    pub fn commit(&self, message: &BorrowedMessage<'_>) -> Result<(), BrokerError> {
        self.consumer
            .commit_message(message, CommitMode::Async)
            .map_err(|e| BrokerError::Consume(format!("Offset commit failed: {}", e)))
    }
}
