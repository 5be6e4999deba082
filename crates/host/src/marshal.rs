/// JSON marshalling between hosts and script values.
///
/// Property files are flat JSON objects: `{"speed": 2.5, "position": {"x": 0.0, "y": 1.0}}`.
/// Integers read as `i32`, numbers with a fraction as `f32`.

use ferris_language::Diagnostic;
use ferris_runtime::Value;
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON object of properties")]
    NotAnObject,
    #[error("property `{name}` has unsupported value {json}")]
    Unsupported { name: String, json: String },
}

pub fn value_from_json(json: &serde_json::Value) -> Option<Value> {
    serde_json::from_value(json.clone()).ok()
}

pub fn value_to_json(value: &Value) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

pub fn properties_from_json(text: &str) -> Result<BTreeMap<String, Value>, MarshalError> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    let serde_json::Value::Object(map) = json else {
        return Err(MarshalError::NotAnObject);
    };
    map.iter()
        .map(|(name, json)| match value_from_json(json) {
            Some(value) => Ok((name.clone(), value)),
            None => Err(MarshalError::Unsupported { name: name.clone(), json: json.to_string() }),
        })
        .collect()
}

pub fn properties_to_json<'a>(props: impl IntoIterator<Item = (&'a str, &'a Value)>) -> serde_json::Value {
    let map = props
        .into_iter()
        .map(|(name, value)| (name.to_string(), value_to_json(value)))
        .collect::<serde_json::Map<_, _>>();
    serde_json::Value::Object(map)
}

pub fn diagnostics_to_json(diagnostics: &[Diagnostic]) -> Result<String, MarshalError> {
    Ok(serde_json::to_string_pretty(diagnostics)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferris_runtime::{NodeRef, Vector2};
    use serde_json::json;

    #[test]
    fn test_value_shapes() {
        assert_eq!(value_from_json(&json!(3)), Some(Value::Int(3)));
        assert_eq!(value_from_json(&json!(2.5)), Some(Value::Float(2.5)));
        assert_eq!(value_from_json(&json!("hi")), Some(Value::from("hi")));
        assert_eq!(value_from_json(&json!({"x": 1.0, "y": 2})), Some(Value::Vector2(Vector2::new(1.0, 2.0))));
        assert_eq!(value_from_json(&json!({"node": 7})), Some(Value::Node(NodeRef { node: 7 })));
        assert_eq!(value_from_json(&json!([1, 2])), None);
    }

    #[test]
    fn test_properties_file() {
        let props = properties_from_json(r#"{"speed": 2.5, "alive": true}"#).unwrap();
        assert_eq!(props["speed"], Value::Float(2.5));
        let back = properties_to_json(props.iter().map(|(k, v)| (k.as_str(), v)));
        assert_eq!(back, json!({"alive": true, "speed": 2.5}));

        assert!(matches!(properties_from_json("[1]"), Err(MarshalError::NotAnObject)));
        assert!(matches!(
            properties_from_json(r#"{"list": [1]}"#),
            Err(MarshalError::Unsupported { name, .. }) if name == "list"
        ));
    }

    #[test]
    fn test_vector_to_json() {
        assert_eq!(value_to_json(&Value::Vector2(Vector2::new(0.5, -1.0))), json!({"x": 0.5, "y": -1.0}));
    }
}
