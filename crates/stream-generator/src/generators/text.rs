//! Untagged string generators.

use chrono::{DateTime, Utc};
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde_json::Value;
use stream_schema::Constraints;

pub const DEFAULT_MIN_LENGTH: usize = 5;
pub const DEFAULT_MAX_LENGTH: usize = 10;

/// Upper bound on generated string length, whatever the schema asks for.
pub const MAX_STRING_LENGTH: usize = 65_536;

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

// 2000-01-01T00:00:00Z .. 2030-12-31T23:59:59Z
const TIMESTAMP_START: i64 = 946_684_800;
const TIMESTAMP_END: i64 = 1_924_991_999;

/// Untagged `string` field.
///
/// A non-empty `enum` wins, then a recognised `format`, then a random
/// lowercase alphanumeric string of `minLength..=maxLength` characters.
pub fn constrained_string(rng: &mut dyn RngCore, constraints: &Constraints) -> Value {
    if let Some(values) = constraints.enum_values() {
        return pick_enum(rng, values);
    }

    if let Some(strategy) = constraints
        .format
        .as_deref()
        .and_then(super::format_strategy)
    {
        return strategy(rng, constraints);
    }

    let min = constraints
        .min_length
        .unwrap_or(DEFAULT_MIN_LENGTH)
        .min(MAX_STRING_LENGTH);
    let max = constraints
        .max_length
        .unwrap_or(DEFAULT_MAX_LENGTH)
        .clamp(min, MAX_STRING_LENGTH);
    Value::String(random_string(rng, min, max))
}

/// Pick one enum value uniformly.
pub fn pick_enum(rng: &mut dyn RngCore, values: &[String]) -> Value {
    values
        .choose(rng)
        .map(|v| Value::String(v.clone()))
        .unwrap_or(Value::Null)
}

/// Random lowercase alphanumeric string with a uniform length in `[min, max]`.
pub fn random_string(rng: &mut dyn RngCore, min: usize, max: usize) -> String {
    let len = rng.gen_range(min..=max);
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Fallback for unrecognised string tags.
pub fn lorem_sentence(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    let sentence: String = Sentence(3..8).fake_with_rng(rng);
    Value::String(sentence)
}

/// RFC 3339 timestamp between 2000 and 2030.
pub fn date_time(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    Value::String(random_timestamp(rng).to_rfc3339())
}

/// Calendar date (`YYYY-MM-DD`) between 2000 and 2030.
pub fn date(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    Value::String(random_timestamp(rng).format("%Y-%m-%d").to_string())
}

fn random_timestamp(rng: &mut dyn RngCore) -> DateTime<Utc> {
    let ts = rng.gen_range(TIMESTAMP_START..=TIMESTAMP_END);
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}
