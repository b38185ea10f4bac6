//! Bundled validator implementations.

use serde_json::Value;
use thiserror::Error;

use super::{Issue, Validate};

/// Failures while building a validator.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema document itself does not compile.
    #[error("schema compilation failed: {0}")]
    Compile(String),
}

/// Accepts any value unchanged.
///
/// Useful for methods whose payloads are free-form, and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyValidator;

impl Validate for AnyValidator {
    fn validate(&self, value: &Value) -> Result<Value, Vec<Issue>> {
        Ok(value.clone())
    }
}

/// A validator compiled from a JSON Schema document.
#[derive(Debug)]
pub struct JsonSchemaValidator {
    compiled: jsonschema::Validator,
}

impl JsonSchemaValidator {
    /// Compiles a JSON Schema document.
    pub fn new(schema: &Value) -> Result<Self, SchemaError> {
        let compiled =
            jsonschema::validator_for(schema).map_err(|err| SchemaError::Compile(err.to_string()))?;
        Ok(Self { compiled })
    }
}

impl Validate for JsonSchemaValidator {
    fn validate(&self, value: &Value) -> Result<Value, Vec<Issue>> {
        let issues: Vec<Issue> = self
            .compiled
            .iter_errors(value)
            .map(|err| Issue::new(err.instance_path.to_string(), err.to_string()))
            .collect();
        if issues.is_empty() {
            Ok(value.clone())
        } else {
            Err(issues)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_schema() -> JsonSchemaValidator {
        JsonSchemaValidator::new(&json!({
            "type": "object",
            "properties": {
                "id": {"type": "string"},
                "age": {"type": "integer", "minimum": 0}
            },
            "required": ["id"]
        }))
        .unwrap()
    }

    #[test]
    fn test_accepts_conforming_value() {
        let value = json!({"id": "123", "age": 4});
        assert_eq!(user_schema().validate(&value).unwrap(), value);
    }

    #[test]
    fn test_rejects_with_pointer_paths() {
        let issues = user_schema()
            .validate(&json!({"id": 123, "age": -1}))
            .unwrap_err();
        assert_eq!(issues.len(), 2);
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert!(paths.contains(&"/id"));
        assert!(paths.contains(&"/age"));
    }

    #[test]
    fn test_missing_required_property() {
        let issues = user_schema().validate(&json!({})).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("id"));
    }

    #[test]
    fn test_invalid_schema_document() {
        let err = JsonSchemaValidator::new(&json!({"type": "no-such-type"})).unwrap_err();
        assert!(matches!(err, SchemaError::Compile(_)));
    }

    #[test]
    fn test_any_validator_passes_everything() {
        assert!(AnyValidator.validate(&json!(null)).is_ok());
        assert!(AnyValidator.validate(&json!([1, {"k": "v"}])).is_ok());
    }
}
