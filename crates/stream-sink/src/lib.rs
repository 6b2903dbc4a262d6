//! Record sinks for json-stream-faker.
//!
//! Every sink is a [`BatchingSink`] wrapped around a [`Destination`]:
//!
//! ```text
//!  send(record) ──► buffer ──(len ≥ batch_size)──► Destination::deliver
//!                     ▲
//!   flush timer ──────┘ (every flush_interval, same lock)
//! ```
//!
//! | Kind    | Batch size | Interval | Output                              |
//! |---------|------------|----------|-------------------------------------|
//! | console | 10         | 1 s      | pretty-printed JSON on stdout       |
//! | file    | 100        | 1 s      | JSON Lines, file truncated on open  |
//! | kafka   | 100 (cfg)  | 1 s (cfg)| JSON payload, UUID v4 key per record|
//!
//! Deliveries that fail part-way keep the undelivered records for the next
//! attempt, bounded by [`BatchSettings::max_retained`].

pub mod batching;
pub mod console;
mod encode;
pub mod error;
pub mod file;
pub mod kafka;
pub mod open;
pub mod sink;

// Re-exports for convenience
pub use batching::{BatchSettings, BatchingSink, DEFAULT_CLOSE_TIMEOUT};
pub use console::{console_sink, ConsoleDestination, ConsoleSink};
pub use error::{DeliveryFailure, SinkError};
pub use file::{file_sink, FileDestination, FileSink};
pub use kafka::{kafka_sink, KafkaDestination, KafkaSink, KafkaSinkConfig};
pub use open::{open_sink, SinkSpec};
pub use sink::{Destination, Sink, SinkKind};
