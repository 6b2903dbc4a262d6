//! Skewed identifier sampler.
//!
//! Produces positive integer ids (optionally prefixed) whose frequency follows
//! a heavy-tailed distribution, so that a few ids recur often and most are
//! rare. Sampling problems never surface as errors: they are logged and the
//! value falls back to a uniform id in `[1, 9_999_999]`.

use rand::{Rng, RngCore};
use rand_distr::{Distribution, LogNormal, Pareto};
use serde_json::Value;
use stream_schema::{Constraints, SkewedIdConfig};
use tracing::warn;

pub const DEFAULT_LOG_NORMAL_SCALE: f64 = 1.0;
pub const DEFAULT_LOG_NORMAL_SHAPE: f64 = 0.5;
pub const DEFAULT_PARETO_SCALE: f64 = 1.0;
pub const DEFAULT_PARETO_SHAPE: f64 = 1.16;

/// Inclusive range of the uniform fallback.
pub const FALLBACK_MIN: i64 = 1;
pub const FALLBACK_MAX: i64 = 9_999_999;

/// Distribution family selected by `skewedIdConfig.distribution`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkewedDistribution {
    /// `mu` and `sigma` of the underlying normal.
    LogNormal { mu: f64, sigma: f64 },
    /// Scale (`xm`) and shape (`alpha`).
    Pareto { scale: f64, shape: f64 },
}

impl SkewedDistribution {
    /// Resolve the distribution from a config, applying defaults.
    ///
    /// Returns `None` when the distribution name is missing or unknown.
    pub fn from_config(config: &SkewedIdConfig) -> Option<Self> {
        let name = config.distribution.as_deref()?;
        match name.to_ascii_lowercase().as_str() {
            "log-normal" => {
                let mu = config.log_normal_scale.unwrap_or(DEFAULT_LOG_NORMAL_SCALE);
                let mut sigma = config.log_normal_shape.unwrap_or(DEFAULT_LOG_NORMAL_SHAPE);
                if sigma <= 0.0 {
                    warn!(
                        "log-normal shape (sigma) must be positive, got {sigma}; using {DEFAULT_LOG_NORMAL_SHAPE}"
                    );
                    sigma = DEFAULT_LOG_NORMAL_SHAPE;
                }
                Some(Self::LogNormal { mu, sigma })
            }
            "pareto" => {
                let mut scale = config.pareto_scale.unwrap_or(DEFAULT_PARETO_SCALE);
                let mut shape = config.pareto_shape.unwrap_or(DEFAULT_PARETO_SHAPE);
                if scale <= 0.0 || shape <= 0.0 {
                    warn!(
                        "pareto scale and shape must be positive, got scale={scale} shape={shape}; using defaults"
                    );
                    scale = DEFAULT_PARETO_SCALE;
                    shape = DEFAULT_PARETO_SHAPE;
                }
                Some(Self::Pareto { scale, shape })
            }
            _ => None,
        }
    }

    /// Draw one id, or `None` if the distribution cannot be built.
    pub fn sample(&self, rng: &mut dyn RngCore) -> Option<i64> {
        let raw = match *self {
            Self::LogNormal { mu, sigma } => match LogNormal::new(mu, sigma) {
                Ok(dist) => dist.sample(rng),
                Err(e) => {
                    warn!("Invalid log-normal parameters mu={mu} sigma={sigma}: {e}");
                    return None;
                }
            },
            Self::Pareto { scale, shape } => match Pareto::new(scale, shape) {
                Ok(dist) => dist.sample(rng),
                Err(e) => {
                    warn!("Invalid pareto parameters scale={scale} shape={shape}: {e}");
                    return None;
                }
            },
        };
        // `as` truncates toward zero and saturates; NaN maps to 0
        Some((raw.floor() as i64).max(1))
    }
}

/// Strategy for the `skewed_id` tag.
pub fn generate_skewed_id(rng: &mut dyn RngCore, constraints: &Constraints) -> Value {
    let default_config = SkewedIdConfig::default();
    let config = constraints.skewed_id.as_ref().unwrap_or(&default_config);
    let prefix = config.prefix.as_deref().unwrap_or("");

    let number = match SkewedDistribution::from_config(config) {
        Some(dist) => dist.sample(rng).unwrap_or_else(|| fallback_id(rng)),
        None => {
            match config.distribution.as_deref() {
                Some(name) => warn!("Unknown skewed_id distribution '{name}', using uniform ids"),
                None => warn!("No skewed_id distribution configured, using uniform ids"),
            }
            fallback_id(rng)
        }
    };

    Value::String(format!("{prefix}{number}"))
}

fn fallback_id(rng: &mut dyn RngCore) -> i64 {
    rng.gen_range(FALLBACK_MIN..=FALLBACK_MAX)
}
