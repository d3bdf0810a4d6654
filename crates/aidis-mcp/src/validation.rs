// aidis-mcp/src/validation.rs
// ============================================================================
// Module: Input Validation
// Description: Compiled per-tool schema validation with trivial coercion.
// Purpose: Reject malformed inputs before dispatch; sanitize strings.
// Dependencies: aidis-contract, jsonschema, serde_json
// ============================================================================

//! ## Overview
//! Every tool's input schema is compiled once at router construction. The
//! validator is pure: the same tool name and payload always yield the same
//! result. Coercion is deliberately trivial, string trimming and
//! numeric-from-string where the schema declares a numeric type, and the
//! first failure names the offending field. Unknown fields are rejected by
//! the closed schemas themselves.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;

use aidis_core::ToolError;
use aidis_core::ToolName;
use jsonschema::Draft;
use jsonschema::Validator;
use serde_json::Value;

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Compiled schema validators for every registered tool.
pub struct SchemaValidator {
    /// Compiled validators keyed by tool.
    validators: HashMap<ToolName, Validator>,
    /// Raw schemas, kept for coercion type lookups.
    schemas: HashMap<ToolName, Value>,
}

impl SchemaValidator {
    /// Compiles the schema catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Internal`] when a schema in the contract fails
    /// to compile; that is a programming error, not a client error.
    pub fn new() -> Result<Self, ToolError> {
        let mut validators = HashMap::new();
        let mut schemas = HashMap::new();
        for tool in ToolName::all() {
            let schema = aidis_contract::input_schema(*tool);
            let compiled = jsonschema::options()
                .with_draft(Draft::Draft202012)
                .build(&schema)
                .map_err(|err| {
                    ToolError::Internal(format!("schema for {tool} failed to compile: {err}"))
                })?;
            validators.insert(*tool, compiled);
            schemas.insert(*tool, schema);
        }
        Ok(Self {
            validators,
            schemas,
        })
    }

    /// Validates `arguments` for `tool`, returning the coerced payload.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidInput`] naming the first offending
    /// field.
    pub fn validate(&self, tool: ToolName, arguments: &Value) -> Result<Value, ToolError> {
        let validator = self
            .validators
            .get(&tool)
            .ok_or_else(|| ToolError::Internal(format!("no validator for {tool}")))?;
        let schema = self
            .schemas
            .get(&tool)
            .ok_or_else(|| ToolError::Internal(format!("no schema for {tool}")))?;
        if !arguments.is_object() {
            return Err(ToolError::InvalidInput("arguments must be an object".to_string()));
        }
        let coerced = coerce(schema, arguments.clone());
        if let Some(error) = validator.iter_errors(&coerced).next() {
            let field = field_label(&error.instance_path().to_string());
            return Err(ToolError::InvalidInput(format!(
                "invalid {field}: {error}"
            )));
        }
        Ok(coerced)
    }
}

// ============================================================================
// SECTION: Coercion
// ============================================================================

/// Applies trivial coercions: trims strings and parses numerics from
/// strings when the property schema declares a numeric type.
fn coerce(schema: &Value, mut arguments: Value) -> Value {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return arguments;
    };
    let Some(map) = arguments.as_object_mut() else {
        return arguments;
    };
    for (key, value) in map.iter_mut() {
        let Some(declared) = properties.get(key).and_then(|p| p.get("type")).and_then(Value::as_str)
        else {
            continue;
        };
        coerce_value(declared, value);
    }
    arguments
}

/// Coerces one value toward its declared type.
fn coerce_value(declared: &str, value: &mut Value) {
    match declared {
        "string" => {
            if let Value::String(text) = value {
                let trimmed = text.trim();
                if trimmed.len() != text.len() {
                    *text = trimmed.to_string();
                }
            }
        }
        "integer" => {
            if let Value::String(text) = value
                && let Ok(parsed) = text.trim().parse::<i64>()
            {
                *value = Value::from(parsed);
            }
        }
        "number" => {
            if let Value::String(text) = value
                && let Ok(parsed) = text.trim().parse::<f64>()
                && let Some(number) = serde_json::Number::from_f64(parsed)
            {
                *value = Value::Number(number);
            }
        }
        _ => {}
    }
}

/// Renders an instance path as a field label for error messages.
fn field_label(instance_path: &str) -> String {
    let trimmed = instance_path.trim_start_matches('/');
    if trimmed.is_empty() {
        "arguments".to_string()
    } else {
        trimmed.replace('/', ".")
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        reason = "Test-only assertions."
    )]

    use aidis_core::ToolError;
    use aidis_core::ToolName;
    use serde_json::json;

    use super::SchemaValidator;

    fn validator() -> SchemaValidator {
        SchemaValidator::new().expect("schemas compile")
    }

    #[test]
    fn valid_arguments_pass() {
        let result = validator()
            .validate(ToolName::ContextStore, &json!({"type": "code", "content": "hello"}));
        assert!(result.is_ok());
    }

    #[test]
    fn missing_required_field_names_the_field() {
        let error = validator()
            .validate(ToolName::ContextStore, &json!({"type": "code"}))
            .expect_err("must fail");
        let ToolError::InvalidInput(message) = error else {
            panic!("wrong error kind");
        };
        assert!(message.contains("content"), "message does not name field: {message}");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = validator()
            .validate(ToolName::AidisPing, &json!({"bogus": true}))
            .expect_err("must fail");
        let ToolError::InvalidInput(message) = error else {
            panic!("wrong error kind");
        };
        assert!(message.contains("bogus"), "message does not name field: {message}");
    }

    #[test]
    fn out_of_range_limit_names_the_field() {
        let error = validator()
            .validate(ToolName::ContextSearch, &json!({"query": "x", "limit": 500}))
            .expect_err("must fail");
        let ToolError::InvalidInput(message) = error else {
            panic!("wrong error kind");
        };
        assert!(message.contains("limit"), "message does not name field: {message}");
    }

    #[test]
    fn strings_are_trimmed() {
        let coerced = validator()
            .validate(ToolName::ProjectSwitch, &json!({"project": "  alpha  "}))
            .expect("valid");
        assert_eq!(coerced["project"], json!("alpha"));
    }

    #[test]
    fn numerics_parse_from_strings() {
        let coerced = validator()
            .validate(ToolName::ContextSearch, &json!({"query": "x", "limit": "5"}))
            .expect("valid");
        assert_eq!(coerced["limit"], json!(5));
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        assert!(validator().validate(ToolName::AidisPing, &json!([1, 2])).is_err());
    }

    #[test]
    fn validation_is_deterministic() {
        let validator = validator();
        let payload = json!({"type": "code", "content": " x "});
        let first = validator.validate(ToolName::ContextStore, &payload).expect("valid");
        let second = validator.validate(ToolName::ContextStore, &payload).expect("valid");
        assert_eq!(first, second);
    }
}
