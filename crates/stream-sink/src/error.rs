//! Error types for record sinks.

use thiserror::Error;

/// A batch delivery that stopped part-way.
///
/// `delivered` counts the leading records of the batch that reached the
/// destination before the failure. The remaining records are retried by the
/// batching layer.
#[derive(Error, Debug)]
#[error("delivery failed after {delivered} record(s): {source}")]
pub struct DeliveryFailure {
    pub delivered: usize,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl DeliveryFailure {
    pub fn new(
        delivered: usize,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            delivered,
            source: source.into(),
        }
    }
}

/// Errors that can occur while opening or using a sink.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Sink is closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Topic '{0}' does not exist and auto-creation is disabled")]
    TopicMissing(String),

    #[error("Topic creation error: {0}")]
    TopicCreation(String),

    #[error("Invalid sink configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Delivery(#[from] DeliveryFailure),
}

impl SinkError {
    /// Whether the error concerns an external resource (file, broker, topic).
    pub fn is_resource_error(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Kafka(_) | Self::TopicMissing(_) | Self::TopicCreation(_)
        )
    }
}
