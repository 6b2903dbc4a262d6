//! Schema model for json-stream-faker.
//!
//! This crate provides the in-memory schema tree consumed by the value
//! generator, and the parser that builds it from a JSON schema document:
//!
//! - [`JsonSchema`] - Root type plus ordered top-level fields
//! - [`FieldDefinition`] - Type, semantic tag, constraints, items/properties
//! - [`Constraints`] / [`SkewedIdConfig`] - Typed generation parameters
//! - [`GeneratedRecord`] - Ordered field → value map produced per record
//!
//! # Architecture
//!
//! ```text
//! stream-schema (this crate)
//!    │
//!    ├─── stream-generator  (reads FieldDefinition trees)
//!    └─── stream-sink       (delivers GeneratedRecord values)
//! ```
//!
//! # Example
//!
//! ```rust
//! use stream_schema::{FieldType, JsonSchema};
//!
//! let schema = JsonSchema::parse(r#"{
//!     "type": "object",
//!     "properties": {
//!         "email": { "type": "string", "faker": "email" },
//!         "age": { "type": "integer", "minimum": 18, "maximum": 80 }
//!     }
//! }"#).unwrap();
//!
//! let age = schema.get_field("age").unwrap();
//! assert_eq!(age.field_type, FieldType::Integer);
//! ```

pub mod parser;
pub mod schema;

// Re-exports for convenience
pub use parser::parse_schema;
pub use schema::{
    Constraints, FieldDefinition, FieldType, GeneratedRecord, JsonSchema, Properties,
    SchemaError, SkewedIdConfig,
};
