//! Sink and Destination trait definitions.

use crate::error::{DeliveryFailure, SinkError};
use serde::{Deserialize, Serialize};
use std::fmt;
use stream_schema::GeneratedRecord;

/// Kind of output a sink writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Console,
    File,
    Kafka,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::File => "file",
            Self::Kafka => "kafka",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record sink used by a generation stream.
///
/// All methods take `&self`: a sink is shared between the stream task that
/// sends records and the background timer that flushes them.
///
/// Within one sink, records are delivered in the order `send` accepted them.
#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    /// Accept one record. May trigger a batch delivery.
    ///
    /// Fails with [`SinkError::Closed`] after [`Sink::close`].
    async fn send(&self, record: GeneratedRecord) -> Result<(), SinkError>;

    /// Deliver everything currently buffered.
    async fn flush(&self) -> Result<(), SinkError>;

    /// Stop the flush timer, deliver what remains and release the destination.
    ///
    /// Calling `close` again is a no-op.
    async fn close(&self) -> Result<(), SinkError>;

    fn kind(&self) -> SinkKind;
}

/// Where a batch of records ends up.
///
/// Implementations deliver records in slice order and, on failure, report
/// how many leading records were delivered.
#[async_trait::async_trait]
pub trait Destination: Send + 'static {
    fn kind(&self) -> SinkKind;

    async fn deliver(&mut self, batch: &[GeneratedRecord]) -> Result<(), DeliveryFailure>;

    /// Flush and drop any underlying resources.
    async fn release(&mut self) -> Result<(), SinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_kind_names() {
        assert_eq!(SinkKind::Console.to_string(), "console");
        assert_eq!(
            serde_json::to_string(&SinkKind::Kafka).unwrap(),
            "\"kafka\""
        );
        let kind: SinkKind = serde_json::from_str("\"file\"").unwrap();
        assert_eq!(kind, SinkKind::File);
    }
}
