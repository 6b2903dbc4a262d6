//! File destination: JSON Lines, one record per line.

use crate::batching::{BatchSettings, BatchingSink};
use crate::encode::{encode_batch, Layout};
use crate::error::{DeliveryFailure, SinkError};
use crate::sink::{Destination, SinkKind};
use std::io::SeekFrom;
use std::path::Path;
use std::time::Duration;
use stream_schema::GeneratedRecord;
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::{info, warn};

pub const FILE_BATCH_SIZE: usize = 100;
pub const FILE_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

pub type FileSink = BatchingSink<FileDestination>;

/// Appends batches to a file, one record per line.
///
/// Each batch is written as a single buffer. When a write fails the file is
/// cut back to the end of the last complete batch, so records retried later
/// never follow a truncated line.
pub struct FileDestination {
    file: File,
    /// Length of the file after the last successful batch
    committed: u64,
}

impl FileDestination {
    /// Create (or truncate) the output file.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let file = File::create(path).await?;
        info!("Writing JSONL output to '{}'", path.display());

        Ok(Self { file, committed: 0 })
    }

    pub fn default_settings() -> BatchSettings {
        BatchSettings::new(FILE_BATCH_SIZE, FILE_FLUSH_INTERVAL)
    }

    async fn append(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let written = match self.file.write_all(bytes).await {
            Ok(()) => self.file.flush().await,
            Err(e) => Err(e),
        };
        match written {
            Ok(()) => {
                self.committed += bytes.len() as u64;
                Ok(())
            }
            Err(e) => {
                self.discard_partial_write().await;
                Err(e)
            }
        }
    }

    async fn discard_partial_write(&mut self) {
        let restored = match self.file.set_len(self.committed).await {
            Ok(()) => self
                .file
                .seek(SeekFrom::Start(self.committed))
                .await
                .map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = restored {
            warn!(
                "Could not cut output file back to {} bytes: {}",
                self.committed, e
            );
        }
    }
}

#[async_trait::async_trait]
impl Destination for FileDestination {
    fn kind(&self) -> SinkKind {
        SinkKind::File
    }

    async fn deliver(&mut self, batch: &[GeneratedRecord]) -> Result<(), DeliveryFailure> {
        let encoded = encode_batch(batch, Layout::Lines);
        self.append(&encoded.bytes)
            .await
            .map_err(|e| DeliveryFailure::new(0, e))?;
        encoded.into_result()
    }

    async fn release(&mut self) -> Result<(), SinkError> {
        self.file.flush().await?;
        self.file.shutdown().await?;
        Ok(())
    }
}

/// Open a file sink with the default batching.
pub async fn file_sink(path: impl AsRef<Path>) -> Result<FileSink, SinkError> {
    let destination = FileDestination::create(path).await?;
    Ok(BatchingSink::new(
        destination,
        FileDestination::default_settings(),
    ))
}
