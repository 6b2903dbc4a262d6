//! Console destination: pretty-printed JSON, one record at a time.

use crate::batching::{BatchSettings, BatchingSink};
use crate::encode::{encode_batch, Layout};
use crate::error::{DeliveryFailure, SinkError};
use crate::sink::{Destination, SinkKind};
use std::time::Duration;
use stream_schema::GeneratedRecord;
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub const CONSOLE_BATCH_SIZE: usize = 10;
pub const CONSOLE_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

pub type ConsoleSink = BatchingSink<ConsoleDestination>;

/// Writes each record as pretty-printed JSON followed by a newline.
pub struct ConsoleDestination {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
}

impl ConsoleDestination {
    /// Destination writing to standard output.
    pub fn stdout() -> Self {
        Self::new(Box::new(tokio::io::stdout()))
    }

    pub fn new(writer: Box<dyn AsyncWrite + Send + Unpin>) -> Self {
        Self { writer }
    }

    pub fn default_settings() -> BatchSettings {
        BatchSettings::new(CONSOLE_BATCH_SIZE, CONSOLE_FLUSH_INTERVAL)
    }
}

#[async_trait::async_trait]
impl Destination for ConsoleDestination {
    fn kind(&self) -> SinkKind {
        SinkKind::Console
    }

    async fn deliver(&mut self, batch: &[GeneratedRecord]) -> Result<(), DeliveryFailure> {
        let encoded = encode_batch(batch, Layout::Pretty);
        let written = match self.writer.write_all(&encoded.bytes).await {
            Ok(()) => self.writer.flush().await,
            Err(e) => Err(e),
        };
        written.map_err(|e| DeliveryFailure::new(0, e))?;
        encoded.into_result()
    }

    async fn release(&mut self) -> Result<(), SinkError> {
        self.writer.flush().await?;
        Ok(())
    }
}

/// Open a console sink writing to stdout with the default batching.
pub fn console_sink() -> ConsoleSink {
    BatchingSink::new(
        ConsoleDestination::stdout(),
        ConsoleDestination::default_settings(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batching::tests::record;
    use crate::sink::Sink;
    use std::io;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};
    use std::task::{Context, Poll};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl AsyncWrite for SharedBuffer {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    /// Writer whose every write fails.
    struct BrokenPipe;

    impl AsyncWrite for BrokenPipe {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_write_failure_delivers_nothing() {
        let mut destination = ConsoleDestination::new(Box::new(BrokenPipe));
        let failure = destination
            .deliver(&[record(1), record(2)])
            .await
            .unwrap_err();
        assert_eq!(failure.delivered, 0);
    }

    #[tokio::test]
    async fn test_console_output_is_pretty_json() {
        let buffer = SharedBuffer::default();
        let sink = BatchingSink::new(
            ConsoleDestination::new(Box::new(buffer.clone())),
            ConsoleDestination::default_settings(),
        );

        for seq in 0..3 {
            sink.send(record(seq)).await.unwrap();
        }
        sink.close().await.unwrap();

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let values: Vec<serde_json::Value> = serde_json::Deserializer::from_str(&output)
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[2]["seq"], 2);
        // Pretty printing spreads each record over several lines
        assert!(output.lines().count() > 3);
    }

    #[test]
    fn test_console_defaults() {
        let settings = ConsoleDestination::default_settings();
        assert_eq!(settings.batch_size, 10);
        assert_eq!(settings.flush_interval, Duration::from_secs(1));
    }
}
