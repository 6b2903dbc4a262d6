//! Kafka destination.
//!
//! Each record is published as a JSON payload keyed by a fresh UUID v4.
//! Deliveries are acknowledged one message at a time, so a failure reports
//! exactly how many records of the batch reached the broker.

use crate::batching::{BatchSettings, BatchingSink};
use crate::error::{DeliveryFailure, SinkError};
use crate::sink::{Destination, SinkKind};
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use std::time::Duration;
use stream_schema::GeneratedRecord;
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(1000);

const METADATA_TIMEOUT: Duration = Duration::from_secs(10);
const SEND_TIMEOUT: Duration = Duration::from_secs(30);
const RELEASE_TIMEOUT: Duration = Duration::from_secs(10);

pub type KafkaSink = BatchingSink<KafkaDestination>;

/// Connection and batching options for a Kafka sink.
#[derive(Debug, Clone, PartialEq)]
pub struct KafkaSinkConfig {
    pub bootstrap_servers: String,
    pub topic: String,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub auto_create_topic: bool,
    pub num_partitions: i32,
    pub replication_factor: i32,
}

impl KafkaSinkConfig {
    pub fn new(bootstrap_servers: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            bootstrap_servers: bootstrap_servers.into(),
            topic: topic.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            auto_create_topic: true,
            num_partitions: 1,
            replication_factor: 1,
        }
    }

    pub fn validate(&self) -> Result<(), SinkError> {
        if self.bootstrap_servers.trim().is_empty() {
            return Err(SinkError::InvalidConfig(
                "bootstrap servers must not be empty".into(),
            ));
        }
        if self.topic.trim().is_empty() {
            return Err(SinkError::InvalidConfig("topic must not be empty".into()));
        }
        if self.batch_size == 0 {
            return Err(SinkError::InvalidConfig(
                "batch size must be positive".into(),
            ));
        }
        if self.flush_interval.is_zero() {
            return Err(SinkError::InvalidConfig(
                "flush interval must be positive".into(),
            ));
        }
        if self.num_partitions < 1 || self.replication_factor < 1 {
            return Err(SinkError::InvalidConfig(
                "partitions and replication factor must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn batch_settings(&self) -> BatchSettings {
        BatchSettings::new(self.batch_size, self.flush_interval)
    }

    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &self.bootstrap_servers)
            .set("message.timeout.ms", "30000");
        config
    }
}

pub struct KafkaDestination {
    producer: FutureProducer,
    topic: String,
}

impl KafkaDestination {
    /// Connect to the cluster and make sure the topic exists.
    pub async fn connect(config: &KafkaSinkConfig) -> Result<Self, SinkError> {
        config.validate()?;

        let producer: FutureProducer = config.client_config().create()?;
        ensure_topic(&producer, config).await?;

        info!(
            "Kafka sink ready: topic '{}' on {}",
            config.topic, config.bootstrap_servers
        );
        Ok(Self {
            producer,
            topic: config.topic.clone(),
        })
    }
}

async fn topic_exists(producer: &FutureProducer, topic: &str) -> Result<bool, SinkError> {
    // Metadata requests block on the librdkafka client
    let producer = producer.clone();
    let topic = topic.to_string();
    tokio::task::spawn_blocking(move || -> Result<bool, SinkError> {
        let metadata = producer.client().fetch_metadata(None, METADATA_TIMEOUT)?;
        Ok(metadata.topics().iter().any(|t| t.name() == topic))
    })
    .await
    .map_err(|e| SinkError::Io(std::io::Error::other(e)))?
}

async fn ensure_topic(
    producer: &FutureProducer,
    config: &KafkaSinkConfig,
) -> Result<(), SinkError> {
    if topic_exists(producer, &config.topic).await? {
        debug!("Topic '{}' exists", config.topic);
        return Ok(());
    }
    if !config.auto_create_topic {
        return Err(SinkError::TopicMissing(config.topic.clone()));
    }
    create_topic(config).await
}

/// Create the topic, treating "already exists" as success.
async fn create_topic(config: &KafkaSinkConfig) -> Result<(), SinkError> {
    let admin_client: AdminClient<DefaultClientContext> = config.client_config().create()?;

    let new_topic = NewTopic::new(
        &config.topic,
        config.num_partitions,
        TopicReplication::Fixed(config.replication_factor),
    );
    let opts = AdminOptions::new().operation_timeout(Some(METADATA_TIMEOUT));

    let results = admin_client
        .create_topics(&[new_topic], &opts)
        .await
        .map_err(|e| SinkError::TopicCreation(format!("Failed to create topic: {e}")))?;

    for result in results {
        match result {
            Ok(topic_name) => info!(
                "Topic '{}' created ({} partition(s), replication {})",
                topic_name, config.num_partitions, config.replication_factor
            ),
            Err((topic_name, err)) => {
                let err_str = err.to_string();
                if err_str.contains("already exists") || err_str.contains("TopicExistsException")
                {
                    info!("Topic '{}' already exists", topic_name);
                } else {
                    return Err(SinkError::TopicCreation(format!(
                        "Failed to create topic {topic_name}: {err}"
                    )));
                }
            }
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl Destination for KafkaDestination {
    fn kind(&self) -> SinkKind {
        SinkKind::Kafka
    }

    async fn deliver(&mut self, batch: &[GeneratedRecord]) -> Result<(), DeliveryFailure> {
        for (i, record) in batch.iter().enumerate() {
            let payload = serde_json::to_string(record).map_err(|e| DeliveryFailure::new(i, e))?;
            let key = Uuid::new_v4().to_string();

            let message = FutureRecord::to(&self.topic).key(&key).payload(&payload);
            self.producer
                .send(message, SEND_TIMEOUT)
                .await
                .map_err(|(err, _)| DeliveryFailure::new(i, err))?;
        }
        debug!("Published {} record(s) to '{}'", batch.len(), self.topic);
        Ok(())
    }

    async fn release(&mut self) -> Result<(), SinkError> {
        let producer = self.producer.clone();
        tokio::task::spawn_blocking(move || producer.flush(RELEASE_TIMEOUT))
            .await
            .map_err(|e| SinkError::Io(std::io::Error::other(e)))??;
        Ok(())
    }
}

/// Connect a Kafka sink using the batching options from `config`.
pub async fn kafka_sink(config: &KafkaSinkConfig) -> Result<KafkaSink, SinkError> {
    let destination = KafkaDestination::connect(config).await?;
    Ok(BatchingSink::new(destination, config.batch_settings()))
}
