//! Error types for stream creation and management.

use stream_schema::SchemaError;
use stream_sink::SinkError;
use thiserror::Error;

/// A stream-creation request that cannot be turned into a stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Schema content cannot be null or empty")]
    MissingSchema,

    #[error("Output configuration cannot be null")]
    MissingOutputConfig,

    #[error("File output type selected, but filePath is missing")]
    MissingFilePath,

    #[error("Kafka output type selected, but kafka configuration is missing")]
    MissingKafkaConfig,

    #[error("Kafka bootstrapServers and topic must be specified")]
    MissingKafkaTarget,

    #[error("{0} must be positive")]
    NotPositive(&'static str),
}

/// Errors returned by [`StreamManager`](crate::manager::StreamManager).
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Stream manager is shutting down")]
    ShuttingDown,

    #[error("Stream capacity reached ({0} concurrent streams)")]
    Capacity(usize),

    #[error("Invalid request: {0}")]
    Request(#[from] RequestError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Failed to open sink: {0}")]
    Sink(#[from] SinkError),
}
