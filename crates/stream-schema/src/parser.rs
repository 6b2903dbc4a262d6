//! JSON schema document parser.
//!
//! Accepts the subset of JSON Schema used for generation: a root object with
//! `properties`, per-field `type`, the `faker` semantic tag, the standard
//! bound/length/pattern/format/enum keywords and, for `faker: "skewed_id"`,
//! a nested `skewedIdConfig` block.

use crate::schema::{
    Constraints, FieldDefinition, FieldType, JsonSchema, Properties, SchemaError, SkewedIdConfig,
};
use serde_json::{Map, Value};

const SKEWED_ID_TAG: &str = "skewed_id";

/// Parse schema content into a [`JsonSchema`].
pub fn parse_schema(content: &str) -> Result<JsonSchema, SchemaError> {
    if content.trim().is_empty() {
        return Err(SchemaError::Empty);
    }

    let root: Value = serde_json::from_str(content)?;
    let root = root
        .as_object()
        .ok_or_else(|| SchemaError::RootNotObject(json_kind(&root).to_string()))?;

    match root.get("type").and_then(Value::as_str) {
        Some("object") => {}
        Some(other) => return Err(SchemaError::RootNotObject(other.to_string())),
        None => return Err(SchemaError::RootNotObject("<missing>".to_string())),
    }

    let fields = match root.get("properties") {
        Some(properties) => parse_properties(properties, "$")?,
        None => Vec::new(),
    };

    Ok(JsonSchema::new("object", fields))
}

fn parse_properties(node: &Value, path: &str) -> Result<Properties, SchemaError> {
    let properties = node.as_object().ok_or_else(|| SchemaError::Malformed {
        path: format!("{path}.properties"),
        reason: format!("expected an object, found {}", json_kind(node)),
    })?;

    properties
        .iter()
        .map(|(name, field)| {
            let field_path = format!("{path}.{name}");
            parse_field(field, &field_path).map(|def| (name.clone(), def))
        })
        .collect()
}

fn parse_field(node: &Value, path: &str) -> Result<FieldDefinition, SchemaError> {
    let field = node.as_object().ok_or_else(|| SchemaError::Malformed {
        path: path.to_string(),
        reason: format!("expected a schema object, found {}", json_kind(node)),
    })?;

    let field_type = match field.get("type") {
        None => FieldType::String,
        Some(Value::String(name)) => FieldType::from_name(name),
        Some(other) => {
            return Err(SchemaError::Malformed {
                path: path.to_string(),
                reason: format!("'type' must be a string, found {}", json_kind(other)),
            })
        }
    };
    if let FieldType::Unsupported(type_name) = &field_type {
        return Err(SchemaError::UnsupportedType {
            path: path.to_string(),
            type_name: type_name.clone(),
        });
    }

    let semantic_tag = field.get("faker").map(value_text);
    let mut constraints = parse_constraints(field);

    if semantic_tag.as_deref() == Some(SKEWED_ID_TAG) {
        if let Some(config) = field.get("skewedIdConfig") {
            constraints.skewed_id = Some(parse_skewed_id_config(config, path)?);
        }
    }

    let mut definition = FieldDefinition::new(field_type.clone()).with_constraints(constraints);
    definition.semantic_tag = semantic_tag;

    match field_type {
        FieldType::Array => {
            if let Some(items) = field.get("items") {
                definition.items = parse_items(items, path)?;
            }
        }
        FieldType::Object => {
            if let Some(properties) = field.get("properties") {
                definition.properties = Some(parse_properties(properties, path)?);
            }
        }
        _ => {}
    }

    Ok(definition)
}

fn parse_items(node: &Value, path: &str) -> Result<Vec<FieldDefinition>, SchemaError> {
    let items_path = format!("{path}.items");
    match node {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| parse_field(item, &format!("{items_path}[{idx}]")))
            .collect(),
        Value::Object(_) => Ok(vec![parse_field(node, &items_path)?]),
        other => Err(SchemaError::Malformed {
            path: items_path,
            reason: format!(
                "expected a schema object or an array of them, found {}",
                json_kind(other)
            ),
        }),
    }
}

fn parse_constraints(field: &Map<String, Value>) -> Constraints {
    Constraints {
        minimum: field.get("minimum").and_then(Value::as_f64),
        maximum: field.get("maximum").and_then(Value::as_f64),
        min_length: field.get("minLength").and_then(as_usize),
        max_length: field.get("maxLength").and_then(as_usize),
        pattern: field.get("pattern").map(value_text),
        format: field.get("format").map(value_text),
        enum_values: field
            .get("enum")
            .and_then(Value::as_array)
            .map(|values| values.iter().map(value_text).collect()),
        skewed_id: None,
    }
}

fn parse_skewed_id_config(node: &Value, path: &str) -> Result<SkewedIdConfig, SchemaError> {
    let config = node.as_object().ok_or_else(|| SchemaError::Malformed {
        path: format!("{path}.skewedIdConfig"),
        reason: format!("expected an object, found {}", json_kind(node)),
    })?;

    Ok(SkewedIdConfig {
        distribution: config.get("distribution").map(value_text),
        prefix: config.get("prefix").map(value_text),
        log_normal_scale: config.get("logNormalScale").and_then(Value::as_f64),
        log_normal_shape: config.get("logNormalShape").and_then(Value::as_f64),
        pareto_scale: config.get("paretoScale").and_then(Value::as_f64),
        pareto_shape: config.get("paretoShape").and_then(Value::as_f64),
    })
}

/// Text form of a JSON value: strings unquoted, everything else as JSON.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_usize(value: &Value) -> Option<usize> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
        .map(|n| n as usize)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const USER_SCHEMA: &str = r#"{
        "type": "object",
        "properties": {
            "id": { "type": "string", "faker": "uuid" },
            "name": { "faker": "name" },
            "age": { "type": "integer", "minimum": 18, "maximum": 80 },
            "status": { "type": "string", "enum": ["active", "inactive", 3] },
            "tags": { "type": "array", "items": { "type": "string", "maxLength": 4 } },
            "address": {
                "type": "object",
                "properties": {
                    "city": { "type": "string", "faker": "city" },
                    "zip": { "type": "string", "faker": "zipCode" }
                }
            },
            "userId": {
                "type": "string",
                "faker": "skewed_id",
                "skewedIdConfig": {
                    "distribution": "pareto",
                    "prefix": "user_",
                    "paretoScale": 2.0,
                    "paretoShape": 1.5
                }
            }
        }
    }"#;

    #[test]
    fn test_parse_full_schema() {
        let schema = parse_schema(USER_SCHEMA).unwrap();
        assert_eq!(schema.root_type(), "object");

        let names: Vec<&str> = schema.fields().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["id", "name", "age", "status", "tags", "address", "userId"]
        );

        let name = schema.get_field("name").unwrap();
        assert_eq!(name.field_type, FieldType::String);
        assert_eq!(name.semantic_tag.as_deref(), Some("name"));

        let age = schema.get_field("age").unwrap();
        assert_eq!(age.constraints.minimum, Some(18.0));
        assert_eq!(age.constraints.maximum, Some(80.0));

        let status = schema.get_field("status").unwrap();
        assert_eq!(
            status.constraints.enum_values.as_deref(),
            Some(&["active".to_string(), "inactive".to_string(), "3".to_string()][..])
        );

        let tags = schema.get_field("tags").unwrap();
        assert_eq!(tags.items.len(), 1);
        assert_eq!(tags.items[0].constraints.max_length, Some(4));

        let address = schema.get_field("address").unwrap();
        let address_fields = address.properties.as_ref().unwrap();
        assert_eq!(address_fields[0].0, "city");
        assert_eq!(address_fields[1].0, "zip");

        let user_id = schema.get_field("userId").unwrap();
        let skewed = user_id.constraints.skewed_id.as_ref().unwrap();
        assert_eq!(skewed.distribution.as_deref(), Some("pareto"));
        assert_eq!(skewed.prefix.as_deref(), Some("user_"));
        assert_eq!(skewed.pareto_scale, Some(2.0));
        assert_eq!(skewed.pareto_shape, Some(1.5));
        assert_eq!(skewed.log_normal_scale, None);
    }

    #[test]
    fn test_root_must_be_object() {
        let result = parse_schema(r#"{"type": "array", "items": {"type": "string"}}"#);
        assert!(matches!(result, Err(SchemaError::RootNotObject(ref t)) if t == "array"));

        let result = parse_schema(r#"{"properties": {}}"#);
        assert!(matches!(result, Err(SchemaError::RootNotObject(_))));

        let result = parse_schema(r#"[1, 2, 3]"#);
        assert!(matches!(result, Err(SchemaError::RootNotObject(ref t)) if t == "array"));
    }

    #[test]
    fn test_empty_and_invalid_content() {
        assert!(matches!(parse_schema("   "), Err(SchemaError::Empty)));
        assert!(matches!(parse_schema("{not json"), Err(SchemaError::Json(_))));
    }

    #[test]
    fn test_unsupported_type_names_path() {
        let result = parse_schema(
            r#"{"type": "object", "properties": {
                "outer": {"type": "object", "properties": {"when": {"type": "date"}}}
            }}"#,
        );
        match result {
            Err(SchemaError::UnsupportedType { path, type_name }) => {
                assert_eq!(path, "$.outer.when");
                assert_eq!(type_name, "date");
            }
            other => panic!("Expected UnsupportedType, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_shapes() {
        let result = parse_schema(r#"{"type": "object", "properties": {"a": 5}}"#);
        assert!(matches!(result, Err(SchemaError::Malformed { ref path, .. }) if path == "$.a"));

        let result = parse_schema(r#"{"type": "object", "properties": []}"#);
        assert!(matches!(result, Err(SchemaError::Malformed { .. })));

        let result = parse_schema(
            r#"{"type": "object", "properties": {"list": {"type": "array", "items": "string"}}}"#,
        );
        assert!(
            matches!(result, Err(SchemaError::Malformed { ref path, .. }) if path == "$.list.items")
        );
    }

    #[test]
    fn test_items_as_array_keeps_all_definitions() {
        let schema = parse_schema(
            r#"{"type": "object", "properties": {
                "mixed": {"type": "array", "items": [{"type": "integer"}, {"type": "boolean"}]}
            }}"#,
        )
        .unwrap();
        let mixed = schema.get_field("mixed").unwrap();
        assert_eq!(mixed.items.len(), 2);
        assert_eq!(mixed.item().unwrap().field_type, FieldType::Integer);
    }

    #[test]
    fn test_shape_keywords_ignored_for_other_types() {
        let schema = parse_schema(
            r#"{"type": "object", "properties": {
                "s": {"type": "string", "items": {"type": "integer"}, "properties": {"x": {}}}
            }}"#,
        )
        .unwrap();
        let s = schema.get_field("s").unwrap();
        assert!(s.items.is_empty());
        assert!(s.properties.is_none());
    }

    #[test]
    fn test_skewed_config_requires_tag() {
        let schema = parse_schema(
            r#"{"type": "object", "properties": {
                "id": {"type": "string", "faker": "uuid",
                       "skewedIdConfig": {"distribution": "pareto"}}
            }}"#,
        )
        .unwrap();
        assert!(schema.get_field("id").unwrap().constraints.skewed_id.is_none());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(USER_SCHEMA.as_bytes()).unwrap();

        let schema = JsonSchema::from_file(file.path()).unwrap();
        assert_eq!(schema.fields().len(), 7);

        let missing = JsonSchema::from_file("/nonexistent/schema.json");
        assert!(matches!(missing, Err(SchemaError::Io(_))));
    }
}
