use serde_json::Value;

/// Copy of `data` without `null`s, empty strings, and the objects and arrays
/// left empty once those are gone. Used before validating form data, where
/// an unset optional field must count as absent.
pub fn strip_null_and_empty(data: &Value) -> Value {
    strip(data).unwrap_or_else(|| match data {
        Value::Array(_) => Value::Array(Vec::new()),
        _ => Value::Object(Default::default()),
    })
}

fn strip(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::Object(map) => {
            let stripped: serde_json::Map<_, _> = map
                .iter()
                .filter_map(|(k, v)| strip(v).map(|v| (k.clone(), v)))
                .collect();
            (!stripped.is_empty()).then_some(Value::Object(stripped))
        }
        Value::Array(items) => {
            let stripped: Vec<_> = items.iter().filter_map(strip).collect();
            (!stripped.is_empty()).then_some(Value::Array(stripped))
        }
        other => Some(other.clone()),
    }
}
