//! JSON Stream Faker
//!
//! Generates streams of synthetic JSON records from a JSON-Schema-like
//! document and delivers them to console, file or Kafka sinks.
//!
//! # Crates
//!
//! - `stream_schema` - schema model and parser
//! - `stream_generator` - schema-driven value generator, including skewed ids
//! - `stream_sink` - batching sinks with a periodic flush timer
//!
//! This crate ties them together: a [`controller::GenerationController`]
//! drives one stream, and the [`manager::StreamManager`] runs many of them
//! on a bounded worker pool.
//!
//! # CLI Usage
//!
//! ```bash
//! # 100 records to stdout
//! json-stream-faker generate --schema user.json --max-messages 100
//!
//! # One minute of records to Kafka
//! json-stream-faker generate --schema user.json --output kafka \
//!   --bootstrap-servers localhost:9092 --topic users --max-time 1m
//!
//! # Several streams described in a file
//! json-stream-faker launch --requests streams.yaml --max-streams 4
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod manager;
pub mod pool;
pub mod request;

pub use config::{ManagerConfig, ManagerOpts};
pub use controller::{GenerationController, StopLimits, StreamState};
pub use error::{ManagerError, RequestError};
pub use manager::{ShutdownReport, StopOutcome, StreamId, StreamManager, StreamSummary};
pub use request::{CreateStreamRequest, CreateStreamResponse, KafkaOutputConfig, OutputConfig};

// Re-export the member crates for convenience
pub use stream_generator as generator;
pub use stream_schema as schema;
pub use stream_sink as sink;
