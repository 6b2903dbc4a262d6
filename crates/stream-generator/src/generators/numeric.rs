//! Numeric value generators.

use super::float_value;
use rand::{Rng, RngCore};
use serde_json::Value;
use stream_schema::Constraints;

/// Default upper bound for untagged `number` fields without a `maximum`.
pub const DEFAULT_NUMBER_MAX: f64 = 1_000_000.0;

/// Width used when the declared range is empty or inverted.
const EXPAND_WIDTH: i64 = 100;

/// Floats beyond this magnitude are clamped so range sampling cannot overflow.
const FLOAT_LIMIT: f64 = 1e15;

/// Generate a random integer in the given range (inclusive).
pub fn generate_int_range(rng: &mut dyn RngCore, min: i64, max: i64) -> Value {
    Value::from(rng.gen_range(min..=max))
}

/// Generate a random float in the given range, rounded to `decimals` places.
///
/// Rounding never moves the value outside `[min, max]`.
pub fn generate_float_range(rng: &mut dyn RngCore, min: f64, max: f64, decimals: i32) -> Value {
    let raw = if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    };
    float_value(round_within(raw, min, max, decimals))
}

/// Integer bounds of an untagged field.
///
/// Missing bounds default to the full `i64` range. An empty or inverted
/// range is widened to `[min, min + 100]`.
pub fn resolve_int_bounds(constraints: &Constraints) -> (i64, i64) {
    // `as` saturates at the i64 bounds
    let min = constraints
        .minimum
        .filter(|m| !m.is_nan())
        .map(|m| m.ceil() as i64)
        .unwrap_or(i64::MIN);
    let mut max = constraints
        .maximum
        .filter(|m| !m.is_nan())
        .map(|m| m.floor() as i64)
        .unwrap_or(i64::MAX);

    if max <= min {
        max = min.saturating_add(EXPAND_WIDTH);
    }
    (min, max)
}

/// Float bounds of an untagged field, widened the same way as integers.
pub fn resolve_float_bounds(constraints: &Constraints) -> (f64, f64) {
    let min = constraints
        .minimum
        .filter(|m| m.is_finite())
        .unwrap_or(0.0)
        .clamp(-FLOAT_LIMIT, FLOAT_LIMIT);
    let mut max = constraints
        .maximum
        .filter(|m| m.is_finite())
        .unwrap_or(DEFAULT_NUMBER_MAX)
        .clamp(-FLOAT_LIMIT, FLOAT_LIMIT);

    if max <= min {
        max = min + EXPAND_WIDTH as f64;
    }
    (min, max)
}

/// Untagged `integer` field.
pub fn constrained_integer(rng: &mut dyn RngCore, constraints: &Constraints) -> Value {
    let (min, max) = resolve_int_bounds(constraints);
    generate_int_range(rng, min, max)
}

/// Untagged `number` field, two decimal places.
pub fn constrained_number(rng: &mut dyn RngCore, constraints: &Constraints) -> Value {
    let (min, max) = resolve_float_bounds(constraints);
    generate_float_range(rng, min, max, 2)
}

fn round_within(value: f64, min: f64, max: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    if rounded < min {
        let up = (min * factor).ceil() / factor;
        if up <= max {
            return up;
        }
        return value;
    }
    if rounded > max {
        let down = (max * factor).floor() / factor;
        if down >= min {
            return down;
        }
        return value;
    }
    rounded
}

// Tagged integer strategies

pub fn age(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    generate_int_range(rng, 1, 100)
}

pub fn year(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    generate_int_range(rng, 1900, 2023)
}

pub fn month(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    generate_int_range(rng, 1, 12)
}

pub fn day(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    generate_int_range(rng, 1, 31)
}

/// Five-digit price.
pub fn price(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    generate_int_range(rng, 10_000, 99_999)
}

pub fn default_integer(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    generate_int_range(rng, 0, 999_999_999)
}

// Tagged number strategies

pub fn latitude(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    generate_float_range(rng, -90.0, 90.0, 6)
}

pub fn longitude(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    generate_float_range(rng, -180.0, 180.0, 6)
}

pub fn percentage(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    generate_float_range(rng, 0.0, 100.0, 2)
}

pub fn default_number(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    generate_float_range(rng, 0.0, 1000.0, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bounds(minimum: Option<f64>, maximum: Option<f64>) -> Constraints {
        Constraints {
            minimum,
            maximum,
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_int_range() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let value = generate_int_range(&mut rng, 10, 20);
            let v = value.as_i64().expect("Expected integer value");
            assert!((10..=20).contains(&v));
        }
    }

    #[test]
    fn test_constrained_integer_respects_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for (lo, hi) in [(-5.0, 5.0), (0.0, 1.0), (1000.0, 1_000_000.0), (-1e12, -1e11)] {
            let constraints = bounds(Some(lo), Some(hi));
            for _ in 0..200 {
                let v = constrained_integer(&mut rng, &constraints).as_i64().unwrap();
                assert!(lo as i64 <= v && v <= hi as i64, "{v} outside [{lo}, {hi}]");
            }
        }
    }

    #[test]
    fn test_inverted_range_expands() {
        assert_eq!(resolve_int_bounds(&bounds(Some(50.0), Some(10.0))), (50, 150));
        assert_eq!(resolve_int_bounds(&bounds(Some(7.0), Some(7.0))), (7, 107));
        assert_eq!(
            resolve_int_bounds(&bounds(Some(i64::MAX as f64), None)),
            (i64::MAX, i64::MAX)
        );
        assert_eq!(resolve_float_bounds(&bounds(Some(5.0), Some(1.0))), (5.0, 105.0));
    }

    #[test]
    fn test_missing_bounds_use_defaults() {
        assert_eq!(resolve_int_bounds(&Constraints::default()), (i64::MIN, i64::MAX));
        assert_eq!(resolve_int_bounds(&bounds(Some(1e30), None)).0, i64::MAX);
        assert_eq!(
            resolve_float_bounds(&Constraints::default()),
            (0.0, DEFAULT_NUMBER_MAX)
        );
    }

    #[test]
    fn test_constrained_number_two_decimals() {
        let mut rng = StdRng::seed_from_u64(42);
        let constraints = bounds(Some(1.0), Some(2.0));

        for _ in 0..200 {
            let v = constrained_number(&mut rng, &constraints).as_f64().unwrap();
            assert!((1.0..=2.0).contains(&v));
            let cents = v * 100.0;
            assert!((cents - cents.round()).abs() < 1e-6, "{v} has more than 2 decimals");
        }
    }

    #[test]
    fn test_round_within_stays_in_range() {
        assert_eq!(round_within(0.004, 0.001, 0.009, 2), 0.004);
        assert_eq!(round_within(0.0049, 0.003, 0.02, 2), 0.01);
        assert_eq!(round_within(1.234, 1.0, 2.0, 2), 1.23);
    }

    #[test]
    fn test_tagged_ranges() {
        let mut rng = StdRng::seed_from_u64(3);
        let none = Constraints::default();
        for _ in 0..200 {
            assert!((1..=100).contains(&age(&mut rng, &none).as_i64().unwrap()));
            assert!((1900..=2023).contains(&year(&mut rng, &none).as_i64().unwrap()));
            assert!((1..=12).contains(&month(&mut rng, &none).as_i64().unwrap()));
            assert!((1..=31).contains(&day(&mut rng, &none).as_i64().unwrap()));
            assert!((10_000..=99_999).contains(&price(&mut rng, &none).as_i64().unwrap()));
            assert!((-90.0..=90.0).contains(&latitude(&mut rng, &none).as_f64().unwrap()));
            assert!((-180.0..=180.0).contains(&longitude(&mut rng, &none).as_f64().unwrap()));
            assert!((0.0..=100.0).contains(&percentage(&mut rng, &none).as_f64().unwrap()));
        }
    }
}
