//! Value generator for json-stream-faker.
//!
//! This crate provides the [`DataGenerator`], which walks a parsed
//! [`JsonSchema`](stream_schema::JsonSchema) and produces one
//! [`GeneratedRecord`](stream_schema::GeneratedRecord) per call.
//!
//! # Architecture
//!
//! ```text
//! JsonSchema (parsed)
//!        │
//!        ▼
//! ┌─────────────────┐
//! │  DataGenerator  │
//! │                 │
//! │  - schema (Arc) │
//! │  - rng (StdRng) │
//! │  - index        │
//! └────────┬────────┘
//!          │   semantic tag? ──► strategy tables (string / integer / number)
//!          │   otherwise     ──► constraint-driven generators
//!          ▼
//!    GeneratedRecord { field → value, schema order }
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use stream_generator::DataGenerator;
//! use stream_schema::JsonSchema;
//!
//! let schema = JsonSchema::parse(r#"{
//!     "type": "object",
//!     "properties": {
//!         "userId": {
//!             "type": "string",
//!             "faker": "skewed_id",
//!             "skewedIdConfig": { "distribution": "pareto", "prefix": "user_" }
//!         },
//!         "email": { "type": "string", "faker": "email" }
//!     }
//! }"#).unwrap();
//!
//! let mut generator = DataGenerator::with_seed(Arc::new(schema), 42).unwrap();
//! let record = generator.next_record().unwrap();
//! assert!(record["userId"].as_str().unwrap().starts_with("user_"));
//! ```
//!
//! # Semantic tags
//!
//! - string: `name`, `firstName`, `lastName`, `email`, `phoneNumber`, `address`,
//!   `street`, `city`, `state`, `zipCode`, `country`, `company`, `uuid`, `ipv4`,
//!   `ipv6`, `url`, `isbn`, `creditCard`, `skewed_id`
//! - integer: `age`, `year`, `month`, `day`, `price`
//! - number: `latitude`, `longitude`, `percentage`
//!
//! Unknown tags fall back to a lorem sentence (string) or a default range.

pub mod generator;
pub mod generators;

// Re-exports for convenience
pub use generator::{DataGenerator, GenerationError, MAX_ARRAY_ITEMS};
pub use generators::skewed_id::SkewedDistribution;
