//! Schema model for record generation.
//!
//! A [`JsonSchema`] is a tree of [`FieldDefinition`]s. Each node carries a
//! JSON type, an optional semantic tag (the `faker` annotation) and the
//! constraints that bound generated values. The tree is immutable once built
//! and only ever read by the generator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A record produced from a schema.
///
/// `serde_json` is built with `preserve_order`, so fields keep the order in
/// which the schema declares them.
pub type GeneratedRecord = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for schema operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error reading schema file
    #[error("Failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    /// Schema content is missing or blank
    #[error("Schema content is empty")]
    Empty,

    /// Error parsing JSON
    #[error("Failed to parse schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Root is not an object schema
    #[error("Root schema must be of type 'object', found '{0}'")]
    RootNotObject(String),

    /// Field declares a type the generator does not support
    #[error("Unsupported type '{type_name}' at {path}")]
    UnsupportedType { path: String, type_name: String },

    /// Field is not shaped like a schema node
    #[error("Malformed field at {path}: {reason}")]
    Malformed { path: String, reason: String },
}

// ============================================================================
// Field Types
// ============================================================================

/// JSON type of a schema node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Null,
    /// Any type name outside the supported set.
    #[serde(untagged)]
    Unsupported(String),
}

impl FieldType {
    /// Resolve a JSON Schema type name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "string" => FieldType::String,
            "integer" => FieldType::Integer,
            "number" => FieldType::Number,
            "boolean" => FieldType::Boolean,
            "array" => FieldType::Array,
            "object" => FieldType::Object,
            "null" => FieldType::Null,
            other => FieldType::Unsupported(other.to_string()),
        }
    }

    /// The JSON Schema name of this type.
    pub fn name(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Null => "null",
            FieldType::Unsupported(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, FieldType::Unsupported(_))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Constraints
// ============================================================================

/// Parameters of the `skewed_id` semantic tag.
///
/// Every field is optional; the generator applies defaults and repairs
/// invalid values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkewedIdConfig {
    /// `log-normal` or `pareto`
    pub distribution: Option<String>,
    /// Prepended to the sampled integer
    pub prefix: Option<String>,
    /// Mean of the underlying normal distribution
    pub log_normal_scale: Option<f64>,
    /// Standard deviation of the underlying normal distribution
    pub log_normal_shape: Option<f64>,
    /// Pareto location (xm)
    pub pareto_scale: Option<f64>,
    /// Pareto tail index (alpha)
    pub pareto_shape: Option<f64>,
}

/// Constraints attached to a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
    pub format: Option<String>,
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<String>>,
    pub skewed_id: Option<SkewedIdConfig>,
}

impl Constraints {
    /// Enum values, if any are declared.
    pub fn enum_values(&self) -> Option<&[String]> {
        self.enum_values
            .as_deref()
            .filter(|values| !values.is_empty())
    }
}

// ============================================================================
// Schema Tree
// ============================================================================

/// Insertion-ordered mapping from field name to definition.
pub type Properties = Vec<(String, FieldDefinition)>;

/// A node in the schema tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// JSON type of the field
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Semantic tag selecting a generation strategy
    pub semantic_tag: Option<String>,

    /// Bounds and generation parameters
    #[serde(default)]
    pub constraints: Constraints,

    /// Item definitions (array only; the first one is used)
    #[serde(default)]
    pub items: Vec<FieldDefinition>,

    /// Child fields (object only)
    pub properties: Option<Properties>,
}

impl FieldDefinition {
    /// Create an untagged, unconstrained field of the given type.
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            semantic_tag: None,
            constraints: Constraints::default(),
            items: Vec::new(),
            properties: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.semantic_tag = Some(tag.into());
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Set the item definitions. Ignored unless the field is an array.
    pub fn with_items(mut self, items: Vec<FieldDefinition>) -> Self {
        if self.field_type == FieldType::Array {
            self.items = items;
        }
        self
    }

    /// Set the child fields. Ignored unless the field is an object.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        if self.field_type == FieldType::Object {
            self.properties = Some(properties);
        }
        self
    }

    /// The representative item definition of an array field.
    pub fn item(&self) -> Option<&FieldDefinition> {
        self.items.first()
    }
}

/// Root of a schema: a root type plus its top-level fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema {
    root_type: String,
    fields: Properties,
}

impl JsonSchema {
    /// Build a schema from already-parsed parts.
    pub fn new(root_type: impl Into<String>, fields: Properties) -> Self {
        Self {
            root_type: root_type.into(),
            fields,
        }
    }

    /// Parse a schema document.
    pub fn parse(content: &str) -> Result<Self, SchemaError> {
        crate::parser::parse_schema(content)
    }

    /// Read and parse a schema file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn root_type(&self) -> &str {
        &self.root_type
    }

    pub fn fields(&self) -> &Properties {
        &self.fields
    }

    /// Get a top-level field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, def)| def)
    }

    /// Fail unless the root can produce records.
    pub fn ensure_object_root(&self) -> Result<(), SchemaError> {
        if self.root_type == "object" {
            Ok(())
        } else {
            Err(SchemaError::RootNotObject(self.root_type.clone()))
        }
    }
}
