//! Argument checks against a tool's JSON schema.
//!
//! Each tool's schema is compiled once when the tool is registered; calls
//! are then checked against the compiled validator. A top-level key whose
//! value is `null` counts as absent.

use serde_json::{Map, Value};

/// Result of checking a tool's arguments.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// All errors as one line.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// JSON pointer of the offending value without the leading `/`, or
    /// `arguments` for the argument object itself.
    pub field: String,
    pub message: String,
}

/// A tool's parameter schema, compiled.
pub struct ArgumentValidator {
    inner: jsonschema::Validator,
}

impl ArgumentValidator {
    /// Compile `schema`. Fails when the schema itself is malformed.
    pub fn compile(schema: &Value) -> Result<Self, String> {
        jsonschema::validator_for(schema)
            .map(|inner| Self { inner })
            .map_err(|e| format!("invalid schema: {e}"))
    }

    /// Check `params`, collecting every violation.
    pub fn check(&self, params: &Value) -> ValidationResult {
        let present;
        let params = match params.as_object() {
            Some(map) if map.values().any(Value::is_null) => {
                present = Value::Object(without_nulls(map));
                &present
            }
            _ => params,
        };

        let errors = self
            .inner
            .iter_errors(params)
            .map(|e| {
                let path = e.instance_path.to_string();
                let field = path.trim_start_matches('/');
                ValidationError {
                    field: if field.is_empty() {
                        "arguments".to_string()
                    } else {
                        field.to_string()
                    },
                    message: e.to_string(),
                }
            })
            .collect();
        ValidationResult::from_errors(errors)
    }
}

fn without_nulls(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
