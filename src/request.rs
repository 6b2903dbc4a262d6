//! Stream-creation request and response DTOs.
//!
//! Field names follow the camelCase JSON of the request body:
//!
//! ```json
//! {
//!   "schemaContent": "{\"type\": \"object\", \"properties\": {...}}",
//!   "outputConfig": {
//!     "type": "kafka",
//!     "kafka": { "bootstrapServers": "localhost:9092", "topic": "events" }
//!   },
//!   "maxMessages": 1000,
//!   "maxTimeInSeconds": 60
//! }
//! ```

use crate::controller::StopLimits;
use crate::error::RequestError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use stream_sink::{KafkaSinkConfig, SinkSpec};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStreamRequest {
    /// The JSON schema document, as a string
    pub schema_content: Option<String>,
    pub output_config: Option<OutputConfig>,
    pub max_messages: Option<u64>,
    pub max_time_in_seconds: Option<u64>,
    /// Fixed RNG seed for reproducible output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    /// "console", "file" or "kafka"; anything else means console
    #[serde(rename = "type")]
    pub output_type: Option<String>,
    pub file_path: Option<String>,
    pub kafka: Option<KafkaOutputConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KafkaOutputConfig {
    pub bootstrap_servers: Option<String>,
    pub topic: Option<String>,
    pub batch_size: Option<usize>,
    pub interval_ms: Option<u64>,
    pub auto_create_topic: Option<bool>,
    pub num_partitions: Option<i32>,
    pub replication_factor: Option<i32>,
}

/// A validated request, ready to be launched.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamPlan {
    pub schema_content: String,
    pub sink: SinkSpec,
    pub limits: StopLimits,
    pub seed: Option<u64>,
}

impl CreateStreamRequest {
    pub fn new(schema_content: impl Into<String>, output_config: OutputConfig) -> Self {
        Self {
            schema_content: Some(schema_content.into()),
            output_config: Some(output_config),
            ..Default::default()
        }
    }

    pub fn with_max_messages(mut self, max_messages: u64) -> Self {
        self.max_messages = Some(max_messages);
        self
    }

    pub fn with_max_time(mut self, seconds: u64) -> Self {
        self.max_time_in_seconds = Some(seconds);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the request and resolve its sink and stopping criteria.
    pub fn validate(&self) -> Result<StreamPlan, RequestError> {
        let schema_content = self
            .schema_content
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(RequestError::MissingSchema)?;
        let output = self
            .output_config
            .as_ref()
            .ok_or(RequestError::MissingOutputConfig)?;

        Ok(StreamPlan {
            schema_content: schema_content.to_string(),
            sink: output.sink_spec()?,
            limits: StopLimits {
                max_messages: self.max_messages,
                max_duration: self.max_time_in_seconds.map(Duration::from_secs),
            },
            seed: self.seed,
        })
    }
}

impl OutputConfig {
    pub fn console() -> Self {
        Self {
            output_type: Some("console".to_string()),
            ..Default::default()
        }
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self {
            output_type: Some("file".to_string()),
            file_path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn kafka(kafka: KafkaOutputConfig) -> Self {
        Self {
            output_type: Some("kafka".to_string()),
            kafka: Some(kafka),
            ..Default::default()
        }
    }

    fn sink_spec(&self) -> Result<SinkSpec, RequestError> {
        let output_type = self
            .output_type
            .as_deref()
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "console".to_string());

        match output_type.as_str() {
            "file" => {
                let path = self
                    .file_path
                    .as_deref()
                    .filter(|p| !p.trim().is_empty())
                    .ok_or(RequestError::MissingFilePath)?;
                Ok(SinkSpec::File {
                    path: PathBuf::from(path),
                })
            }
            "kafka" => {
                let kafka = self.kafka.as_ref().ok_or(RequestError::MissingKafkaConfig)?;
                Ok(SinkSpec::Kafka(kafka.sink_config()?))
            }
            "console" => Ok(SinkSpec::Console),
            other => {
                warn!("Unknown output type '{}', using console", other);
                Ok(SinkSpec::Console)
            }
        }
    }
}

impl KafkaOutputConfig {
    pub fn new(bootstrap_servers: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            bootstrap_servers: Some(bootstrap_servers.into()),
            topic: Some(topic.into()),
            ..Default::default()
        }
    }

    fn sink_config(&self) -> Result<KafkaSinkConfig, RequestError> {
        let (Some(servers), Some(topic)) = (
            non_blank(&self.bootstrap_servers),
            non_blank(&self.topic),
        ) else {
            return Err(RequestError::MissingKafkaTarget);
        };

        let mut config = KafkaSinkConfig::new(servers, topic);
        if let Some(batch_size) = self.batch_size {
            if batch_size == 0 {
                return Err(RequestError::NotPositive("batchSize"));
            }
            config.batch_size = batch_size;
        }
        if let Some(interval_ms) = self.interval_ms {
            if interval_ms == 0 {
                return Err(RequestError::NotPositive("intervalMs"));
            }
            config.flush_interval = Duration::from_millis(interval_ms);
        }
        if let Some(auto_create) = self.auto_create_topic {
            config.auto_create_topic = auto_create;
        }
        if let Some(partitions) = self.num_partitions {
            if partitions < 1 {
                return Err(RequestError::NotPositive("numPartitions"));
            }
            config.num_partitions = partitions;
        }
        if let Some(replication) = self.replication_factor {
            if replication < 1 {
                return Err(RequestError::NotPositive("replicationFactor"));
            }
            config.replication_factor = replication;
        }
        Ok(config)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Outcome reported to whoever submitted a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubmissionStatus {
    Submitted,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStreamResponse {
    pub stream_id: Option<String>,
    pub status: SubmissionStatus,
    pub message: String,
}

impl CreateStreamResponse {
    pub fn submitted(stream_id: impl Into<String>) -> Self {
        let stream_id = stream_id.into();
        Self {
            message: format!("Stream {stream_id} submitted"),
            stream_id: Some(stream_id),
            status: SubmissionStatus::Submitted,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            stream_id: None,
            status: SubmissionStatus::Error,
            message: message.into(),
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.status == SubmissionStatus::Submitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"{"type": "object", "properties": {"id": {"type": "string"}}}"#;

    #[test]
    fn test_deserialize_camel_case_request() {
        let request: CreateStreamRequest = serde_json::from_str(
            r#"{
                "schemaContent": "{\"type\": \"object\"}",
                "outputConfig": {
                    "type": "KAFKA",
                    "kafka": {
                        "bootstrapServers": "localhost:9092",
                        "topic": "events",
                        "batchSize": 50,
                        "intervalMs": 250,
                        "autoCreateTopic": false
                    }
                },
                "maxMessages": 10,
                "maxTimeInSeconds": 30
            }"#,
        )
        .unwrap();

        let plan = request.validate().unwrap();
        assert_eq!(plan.limits.max_messages, Some(10));
        assert_eq!(plan.limits.max_duration, Some(Duration::from_secs(30)));
        let SinkSpec::Kafka(kafka) = plan.sink else {
            panic!("expected kafka sink");
        };
        assert_eq!(kafka.topic, "events");
        assert_eq!(kafka.batch_size, 50);
        assert_eq!(kafka.flush_interval, Duration::from_millis(250));
        assert!(!kafka.auto_create_topic);
        assert_eq!(kafka.num_partitions, 1);
    }

    #[test]
    fn test_missing_schema_or_output() {
        let request = CreateStreamRequest {
            schema_content: Some("   ".to_string()),
            output_config: Some(OutputConfig::console()),
            ..Default::default()
        };
        assert_eq!(request.validate(), Err(RequestError::MissingSchema));

        let request = CreateStreamRequest {
            schema_content: Some(SCHEMA.to_string()),
            ..Default::default()
        };
        assert_eq!(request.validate(), Err(RequestError::MissingOutputConfig));
    }

    #[test]
    fn test_output_type_resolution() {
        let plan = CreateStreamRequest::new(SCHEMA, OutputConfig::default())
            .validate()
            .unwrap();
        assert_eq!(plan.sink, SinkSpec::Console);
        assert!(plan.limits.is_unlimited());

        let unknown = OutputConfig {
            output_type: Some("carrier-pigeon".to_string()),
            ..Default::default()
        };
        let plan = CreateStreamRequest::new(SCHEMA, unknown).validate().unwrap();
        assert_eq!(plan.sink, SinkSpec::Console);

        let plan = CreateStreamRequest::new(SCHEMA, OutputConfig::file("/tmp/out.jsonl"))
            .validate()
            .unwrap();
        assert_eq!(
            plan.sink,
            SinkSpec::File {
                path: PathBuf::from("/tmp/out.jsonl")
            }
        );
    }

    #[test]
    fn test_destination_fields_required() {
        let file = OutputConfig {
            output_type: Some("file".to_string()),
            ..Default::default()
        };
        assert_eq!(
            CreateStreamRequest::new(SCHEMA, file).validate(),
            Err(RequestError::MissingFilePath)
        );

        let kafka = OutputConfig {
            output_type: Some("kafka".to_string()),
            ..Default::default()
        };
        assert_eq!(
            CreateStreamRequest::new(SCHEMA, kafka).validate(),
            Err(RequestError::MissingKafkaConfig)
        );

        let kafka = OutputConfig::kafka(KafkaOutputConfig {
            topic: Some("events".to_string()),
            ..Default::default()
        });
        assert_eq!(
            CreateStreamRequest::new(SCHEMA, kafka).validate(),
            Err(RequestError::MissingKafkaTarget)
        );

        let kafka = OutputConfig::kafka(KafkaOutputConfig {
            batch_size: Some(0),
            ..KafkaOutputConfig::new("localhost:9092", "events")
        });
        assert_eq!(
            CreateStreamRequest::new(SCHEMA, kafka).validate(),
            Err(RequestError::NotPositive("batchSize"))
        );
    }

    #[test]
    fn test_response_serialization() {
        let response = CreateStreamResponse::submitted("abc");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["streamId"], "abc");
        assert_eq!(json["status"], "SUBMITTED");
        assert!(response.is_submitted());

        let json = serde_json::to_value(CreateStreamResponse::error("boom")).unwrap();
        assert_eq!(json["status"], "ERROR");
        assert_eq!(json["streamId"], serde_json::Value::Null);
        assert_eq!(json["message"], "boom");
    }
}
