//! Main data generator for producing schema-conformant records.

use crate::generators::{integer_strategies, number_strategies, numeric, string_strategies, text};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::sync::Arc;
use stream_schema::{
    FieldDefinition, FieldType, GeneratedRecord, JsonSchema, Properties, SchemaError,
};

/// Maximum number of elements produced for an array field.
pub const MAX_ARRAY_ITEMS: usize = 5;

/// Error type for generator operations.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Field type the generator has no strategy for
    #[error("Unsupported field type '{0}'")]
    UnsupportedType(String),
}

/// Data generator that produces records from a parsed schema.
///
/// Construct with [`DataGenerator::with_seed`] for reproducible output.
pub struct DataGenerator {
    /// Schema shared with the stream that owns this generator
    schema: Arc<JsonSchema>,
    rng: StdRng,
}

impl DataGenerator {
    /// Create a generator seeded from OS entropy.
    ///
    /// Fails when the schema root is not an object, before any record exists.
    pub fn new(schema: Arc<JsonSchema>) -> Result<Self, SchemaError> {
        Self::with_rng(schema, StdRng::from_entropy())
    }

    /// Create a generator with a fixed seed.
    pub fn with_seed(schema: Arc<JsonSchema>, seed: u64) -> Result<Self, SchemaError> {
        Self::with_rng(schema, StdRng::seed_from_u64(seed))
    }

    fn with_rng(schema: Arc<JsonSchema>, rng: StdRng) -> Result<Self, SchemaError> {
        schema.ensure_object_root()?;
        Ok(Self { schema, rng })
    }

    /// Generate the next record from the root properties.
    pub fn next_record(&mut self) -> Result<GeneratedRecord, GenerationError> {
        let schema = Arc::clone(&self.schema);
        self.generate_record(schema.fields())
    }

    /// Generate one value per property, preserving property order.
    pub fn generate_record(
        &mut self,
        properties: &Properties,
    ) -> Result<GeneratedRecord, GenerationError> {
        let mut record = GeneratedRecord::new();
        for (name, field) in properties {
            record.insert(name.clone(), self.generate(field)?);
        }
        Ok(record)
    }

    /// Generate a value for a single field definition.
    pub fn generate(&mut self, field: &FieldDefinition) -> Result<Value, GenerationError> {
        let tag = field.semantic_tag.as_deref();
        let constraints = &field.constraints;

        let value = match &field.field_type {
            FieldType::String => match tag {
                Some(tag) => string_strategies().lookup(tag)(&mut self.rng, constraints),
                None => text::constrained_string(&mut self.rng, constraints),
            },
            FieldType::Integer => match tag {
                Some(tag) => integer_strategies().lookup(tag)(&mut self.rng, constraints),
                None => numeric::constrained_integer(&mut self.rng, constraints),
            },
            FieldType::Number => match tag {
                Some(tag) => number_strategies().lookup(tag)(&mut self.rng, constraints),
                None => numeric::constrained_number(&mut self.rng, constraints),
            },
            FieldType::Boolean => Value::Bool(self.rng.gen_bool(0.5)),
            FieldType::Array => self.generate_array(field)?,
            FieldType::Object => match &field.properties {
                Some(properties) => Value::Object(self.generate_record(properties)?),
                None => Value::Object(GeneratedRecord::new()),
            },
            FieldType::Null => Value::Null,
            FieldType::Unsupported(name) => {
                return Err(GenerationError::UnsupportedType(name.clone()))
            }
        };
        Ok(value)
    }

    fn generate_array(&mut self, field: &FieldDefinition) -> Result<Value, GenerationError> {
        // Only the first item definition is used
        let Some(item) = field.item() else {
            return Ok(Value::Array(Vec::new()));
        };

        let count = self.rng.gen_range(1..=MAX_ARRAY_ITEMS);
        let values = (0..count)
            .map(|_| self.generate(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Array(values))
    }
}

impl Iterator for DataGenerator {
    type Item = Result<GeneratedRecord, GenerationError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_record())
    }
}
