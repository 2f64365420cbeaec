//! Top-level checks of tool call arguments against their JSON Schema.

use serde_json::Value;

use crate::error::AgentLabError;

/// Check object shape, required fields, and declared property types.
///
/// Nested schemas are not descended into.
pub fn validate_arguments(tool_name: &str, args: &Value, schema: &Value) -> Result<(), AgentLabError> {
    let invalid = |message: String| AgentLabError::ToolExecution {
        tool_name: tool_name.to_string(),
        message,
    };

    let is_object_schema = schema.get("type").and_then(Value::as_str) == Some("object");
    let Some(obj) = args.as_object() else {
        if is_object_schema {
            return Err(invalid(format!("expected object arguments, got {}", type_name(args))));
        }
        return Ok(());
    };

    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str);
    for name in required {
        if !obj.contains_key(name) {
            return Err(invalid(format!("missing required field '{name}'")));
        }
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (key, value) in obj {
            let expected = properties
                .get(key)
                .and_then(|p| p.get("type"))
                .and_then(Value::as_str);
            if let Some(expected) = expected {
                if !matches_type(value, expected) {
                    return Err(invalid(format!(
                        "field '{key}' expected type '{expected}', got {}",
                        type_name(value)
                    )));
                }
            }
        }
    }

    Ok(())
}

fn matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
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
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {"query": {"type": "string"}},
            "required": ["query"],
        })
    }

    #[test]
    fn accepts_matching_arguments() {
        assert!(validate_arguments("search", &json!({"query": "rust"}), &schema()).is_ok());
    }

    #[test]
    fn reports_first_violation() {
        let err = validate_arguments("search", &json!({}), &schema()).unwrap_err();
        assert!(err.to_string().contains("missing required field 'query'"));

        let err = validate_arguments("search", &json!({"query": 3}), &schema()).unwrap_err();
        assert!(err.to_string().contains("expected type 'string', got number"));

        let err = validate_arguments("search", &json!("rust"), &schema()).unwrap_err();
        assert!(err.to_string().contains("expected object arguments"));
    }
}
