//! Value generation strategies.
//!
//! Semantic tags are resolved through three static lookup tables (string,
//! integer and number fields). Each table maps a tag name to a pure
//! strategy function and carries an explicit fallback entry for tags it does
//! not recognise. Untagged fields are handled by the constraint-driven
//! generators in [`numeric`] and [`text`].

pub mod identifiers;
pub mod numeric;
pub mod people;
pub mod skewed_id;
pub mod text;

use rand::RngCore;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;
use stream_schema::Constraints;

/// A generation strategy for one semantic tag.
pub type Strategy = fn(&mut dyn RngCore, &Constraints) -> Value;

/// Tag name → strategy lookup with an explicit fallback.
pub struct StrategyTable {
    entries: HashMap<&'static str, Strategy>,
    fallback: Strategy,
}

impl StrategyTable {
    fn new(entries: &[(&'static str, Strategy)], fallback: Strategy) -> Self {
        Self {
            entries: entries.iter().copied().collect(),
            fallback,
        }
    }

    /// Strategy for `tag`, or the fallback entry.
    pub fn lookup(&self, tag: &str) -> Strategy {
        self.entries.get(tag).copied().unwrap_or(self.fallback)
    }

    /// Whether `tag` has a dedicated entry.
    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Registered tag names, sorted.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.entries.keys().copied().collect();
        tags.sort_unstable();
        tags
    }
}

const STRING_TAGS: &[(&str, Strategy)] = &[
    ("name", people::full_name),
    ("firstName", people::first_name),
    ("lastName", people::last_name),
    ("email", people::email),
    ("phoneNumber", people::phone_number),
    ("address", people::address),
    ("street", people::street),
    ("city", people::city),
    ("state", people::state),
    ("zipCode", people::zip_code),
    ("country", people::country),
    ("company", people::company),
    ("uuid", identifiers::uuid_v4),
    ("ipv4", identifiers::ipv4),
    ("ipv6", identifiers::ipv6),
    ("url", identifiers::url),
    ("isbn", identifiers::isbn13),
    ("creditCard", identifiers::credit_card),
    ("skewed_id", skewed_id::generate_skewed_id),
];

const INTEGER_TAGS: &[(&str, Strategy)] = &[
    ("age", numeric::age),
    ("year", numeric::year),
    ("month", numeric::month),
    ("day", numeric::day),
    ("price", numeric::price),
];

const NUMBER_TAGS: &[(&str, Strategy)] = &[
    ("latitude", numeric::latitude),
    ("longitude", numeric::longitude),
    ("percentage", numeric::percentage),
];

/// Strategies for tagged `string` fields.
pub fn string_strategies() -> &'static StrategyTable {
    static TABLE: OnceLock<StrategyTable> = OnceLock::new();
    TABLE.get_or_init(|| StrategyTable::new(STRING_TAGS, text::lorem_sentence))
}

/// Strategies for tagged `integer` fields.
pub fn integer_strategies() -> &'static StrategyTable {
    static TABLE: OnceLock<StrategyTable> = OnceLock::new();
    TABLE.get_or_init(|| StrategyTable::new(INTEGER_TAGS, numeric::default_integer))
}

/// Strategies for tagged `number` fields.
pub fn number_strategies() -> &'static StrategyTable {
    static TABLE: OnceLock<StrategyTable> = OnceLock::new();
    TABLE.get_or_init(|| StrategyTable::new(NUMBER_TAGS, numeric::default_number))
}

/// Strategy for a recognised string `format` keyword.
pub fn format_strategy(format: &str) -> Option<Strategy> {
    let strategy: Strategy = match format {
        "email" => people::email,
        "uuid" => identifiers::uuid_v4,
        "ipv4" => identifiers::ipv4,
        "ipv6" => identifiers::ipv6,
        "uri" | "url" => identifiers::url,
        "date-time" => text::date_time,
        "date" => text::date,
        _ => return None,
    };
    Some(strategy)
}

/// Convert a float to a JSON number; non-finite values become `null`.
pub(crate) fn float_value(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
