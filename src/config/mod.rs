//! Stream manager configuration.

mod duration;

pub use duration::parse_duration;

use clap::Parser;
use std::time::Duration;

use crate::controller::DEFAULT_YIELD_EVERY;

/// Grace period `shutdown` waits for running streams before aborting them.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(60);

/// Finished streams kept for `status` / `list`.
pub const DEFAULT_FINISHED_RETENTION: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Upper bound on concurrently running streams; `None` is unbounded
    pub max_concurrent_streams: Option<usize>,
    pub shutdown_grace: Duration,
    pub yield_every: u64,
    pub finished_retention: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_streams: None,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            yield_every: DEFAULT_YIELD_EVERY,
            finished_retention: DEFAULT_FINISHED_RETENTION,
        }
    }
}

/// Stream manager command-line options
#[derive(Parser, Debug, Clone)]
pub struct ManagerOpts {
    /// Maximum number of concurrently running streams (unbounded if unset)
    #[arg(long, env = "FAKER_MAX_STREAMS")]
    pub max_streams: Option<usize>,

    /// How long shutdown waits for streams to stop (e.g. "60s", "2m")
    #[arg(long, default_value = "60s", env = "FAKER_SHUTDOWN_GRACE", value_parser = parse_grace)]
    pub shutdown_grace: Duration,

    /// Records generated between cooperative yields
    #[arg(long, default_value_t = DEFAULT_YIELD_EVERY, env = "FAKER_YIELD_EVERY")]
    pub yield_every: u64,
}

fn parse_grace(s: &str) -> Result<Duration, String> {
    parse_duration(s).map_err(|e| format!("{e:#}"))
}

impl From<&ManagerOpts> for ManagerConfig {
    fn from(opts: &ManagerOpts) -> Self {
        Self {
            max_concurrent_streams: opts.max_streams,
            shutdown_grace: opts.shutdown_grace,
            yield_every: opts.yield_every.max(1),
            ..Default::default()
        }
    }
}
