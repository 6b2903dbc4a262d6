//! Sink construction from a declarative description.

use crate::console::console_sink;
use crate::error::SinkError;
use crate::file::file_sink;
use crate::kafka::{kafka_sink, KafkaSinkConfig};
use crate::sink::{Sink, SinkKind};
use std::path::PathBuf;

/// Which destination a stream writes to.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkSpec {
    Console,
    File { path: PathBuf },
    Kafka(KafkaSinkConfig),
}

impl SinkSpec {
    pub fn kind(&self) -> SinkKind {
        match self {
            Self::Console => SinkKind::Console,
            Self::File { .. } => SinkKind::File,
            Self::Kafka(_) => SinkKind::Kafka,
        }
    }
}

/// Open the sink described by `spec`.
///
/// Failures here (unwritable file, unreachable broker, missing topic) are
/// resource errors: nothing has been generated yet.
pub async fn open_sink(spec: &SinkSpec) -> Result<Box<dyn Sink>, SinkError> {
    let sink: Box<dyn Sink> = match spec {
        SinkSpec::Console => Box::new(console_sink()),
        SinkSpec::File { path } => Box::new(file_sink(path).await?),
        SinkSpec::Kafka(config) => Box::new(kafka_sink(config).await?),
    };
    Ok(sink)
}
