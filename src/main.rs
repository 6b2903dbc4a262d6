//! Command-line interface for json-stream-faker
//!
//! # Usage Examples
//!
//! ## Single stream
//! ```bash
//! # Ten records to stdout, reproducible
//! json-stream-faker generate --schema user.json --max-messages 10 --seed 42
//!
//! # JSON lines to a file for 30 seconds
//! json-stream-faker generate --schema user.json \
//!   --output file --file-path users.jsonl --max-time 30s
//!
//! # Kafka, topic must already exist
//! json-stream-faker generate --schema user.json \
//!   --output kafka --bootstrap-servers localhost:9092 --topic users \
//!   --no-auto-create-topic
//! ```
//!
//! ## Many streams
//! ```bash
//! # streams.yaml holds a list of stream-creation requests
//! json-stream-faker launch --requests streams.yaml --max-streams 8
//! ```
//!
//! Streams run until their limits are reached. Ctrl+C cancels every stream
//! and waits up to `--shutdown-grace` for them to stop.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use json_stream_faker::config::parse_duration;
use json_stream_faker::{
    CreateStreamRequest, KafkaOutputConfig, ManagerConfig, ManagerOpts, OutputConfig,
    StreamManager,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "json-stream-faker")]
#[command(about = "Generate streams of synthetic JSON records from a schema")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single stream
    Generate {
        #[command(flatten)]
        args: GenerateArgs,

        #[command(flatten)]
        manager: ManagerOpts,
    },

    /// Run every stream described in a JSON or YAML file
    Launch {
        /// File containing a list of stream-creation requests
        #[arg(long)]
        requests: PathBuf,

        #[command(flatten)]
        manager: ManagerOpts,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputKind {
    Console,
    File,
    Kafka,
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Schema file (JSON)
    #[arg(long)]
    schema: PathBuf,

    /// Where records go
    #[arg(long, value_enum, default_value = "console")]
    output: OutputKind,

    /// Output file for `--output file`
    #[arg(long)]
    file_path: Option<String>,

    /// Kafka bootstrap servers
    #[arg(long, env = "KAFKA_BOOTSTRAP_SERVERS")]
    bootstrap_servers: Option<String>,

    /// Kafka topic
    #[arg(long)]
    topic: Option<String>,

    /// Records per Kafka batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Kafka flush interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Fail instead of creating a missing topic
    #[arg(long)]
    no_auto_create_topic: bool,

    /// Partitions for an auto-created topic
    #[arg(long)]
    partitions: Option<i32>,

    /// Replication factor for an auto-created topic
    #[arg(long)]
    replication_factor: Option<i32>,

    /// Stop after this many records
    #[arg(long)]
    max_messages: Option<u64>,

    /// Stop after this long (e.g. "90", "30s", "5m", "1h")
    #[arg(long, value_parser = parse_max_time)]
    max_time: Option<Duration>,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

fn parse_max_time(s: &str) -> Result<Duration, String> {
    parse_duration(s).map_err(|e| format!("{e:#}"))
}

impl GenerateArgs {
    fn into_request(self) -> anyhow::Result<CreateStreamRequest> {
        let schema = std::fs::read_to_string(&self.schema)
            .with_context(|| format!("Failed to read schema from {:?}", self.schema))?;

        let output = match self.output {
            OutputKind::Console => OutputConfig::console(),
            OutputKind::File => OutputConfig {
                output_type: Some("file".to_string()),
                file_path: self.file_path,
                ..Default::default()
            },
            OutputKind::Kafka => OutputConfig::kafka(KafkaOutputConfig {
                bootstrap_servers: self.bootstrap_servers,
                topic: self.topic,
                batch_size: self.batch_size,
                interval_ms: self.interval_ms,
                auto_create_topic: Some(!self.no_auto_create_topic),
                num_partitions: self.partitions,
                replication_factor: self.replication_factor,
            }),
        };

        Ok(CreateStreamRequest {
            schema_content: Some(schema),
            output_config: Some(output),
            max_messages: self.max_messages,
            // Sub-second limits round up so they still stop the stream
            max_time_in_seconds: self
                .max_time
                .map(|d| d.as_secs() + u64::from(d.subsec_nanos() > 0)),
            seed: self.seed,
        })
    }
}

fn load_requests(path: &Path) -> anyhow::Result<Vec<CreateStreamRequest>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read requests from {path:?}"))?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let requests = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML requests in {path:?}"))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON requests in {path:?}"))?
    };
    Ok(requests)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Logs go to stderr so console output stays clean JSON
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { args, manager } => {
            let request = args.into_request()?;
            run_streams(vec![request], &manager, true).await
        }
        Commands::Launch { requests, manager } => {
            let requests = load_requests(&requests)?;
            if requests.is_empty() {
                warn!("No stream requests found");
                return Ok(());
            }
            run_streams(requests, &manager, false).await
        }
    }
}

/// Submit every request, then wait for the streams to finish or Ctrl+C.
async fn run_streams(
    requests: Vec<CreateStreamRequest>,
    opts: &ManagerOpts,
    fail_on_rejection: bool,
) -> anyhow::Result<()> {
    let config = ManagerConfig::from(opts);
    let grace = config.shutdown_grace;
    let manager = StreamManager::new(config);

    let mut submitted = 0usize;
    for (i, request) in requests.iter().enumerate() {
        match manager.create(request).await {
            Ok(id) => {
                info!("Request {} started stream {}", i, id);
                submitted += 1;
            }
            Err(e) if fail_on_rejection => {
                return Err(e).context("Failed to start stream");
            }
            Err(e) => error!("Request {} rejected: {}", i, e),
        }
    }
    if submitted == 0 {
        anyhow::bail!("No stream could be started");
    }

    tokio::select! {
        _ = manager.wait_idle() => {
            info!("All streams finished");
        }
        _ = interrupted() => {
            info!("Interrupt received, stopping streams");
        }
    }

    let report = manager.shutdown(grace).await;
    if report.timed_out {
        warn!(
            "{} stream(s) did not stop within {:?}",
            report.aborted.len(),
            grace
        );
    }

    for summary in manager.list().await {
        info!(
            "Stream {} ({}): {} after {} message(s)",
            summary.id, summary.output, summary.state, summary.messages_sent
        );
    }
    Ok(())
}

/// Resolve on Ctrl+C. Never resolves if the signal cannot be watched.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
