use serde_json::{Map, Value};

/// Merge already-normalized `allOf` fragments into one schema node.
///
/// Fragments are applied in order. Later scalar keywords overwrite earlier
/// ones, `enum` lists concatenate, `properties` and `required` union, and
/// object defaults merge key by key.
pub fn merge_all_of(fragments: &[Value]) -> Value {
    let mut merged = Map::new();
    for fragment in fragments {
        if let Value::Object(map) = fragment {
            merge_into(&mut merged, map);
        }
    }
    Value::Object(merged)
}

/// Apply one fragment on top of an accumulated node.
pub(crate) fn merge_into(acc: &mut Map<String, Value>, fragment: &Map<String, Value>) {
    for (key, value) in fragment {
        match key.as_str() {
            "allOf" => {}
            "enum" => merge_enum(acc, value),
            "properties" => merge_properties(acc, value),
            "required" => merge_required(acc, value),
            "default" => merge_default(acc, value),
            _ => {
                acc.insert(key.clone(), value.clone());
            }
        }
    }
}

fn merge_enum(acc: &mut Map<String, Value>, incoming: &Value) {
    match (acc.get_mut("enum"), incoming) {
        (Some(Value::Array(existing)), Value::Array(values)) => {
            existing.extend(values.iter().cloned());
        }
        _ => {
            acc.insert("enum".to_string(), incoming.clone());
        }
    }
}

fn merge_required(acc: &mut Map<String, Value>, incoming: &Value) {
    match (acc.get_mut("required"), incoming) {
        (Some(Value::Array(existing)), Value::Array(values)) => {
            for value in values {
                if !existing.contains(value) {
                    existing.push(value.clone());
                }
            }
        }
        _ => {
            acc.insert("required".to_string(), incoming.clone());
        }
    }
}

fn merge_properties(acc: &mut Map<String, Value>, incoming: &Value) {
    match (acc.get_mut("properties"), incoming) {
        (Some(Value::Object(existing)), Value::Object(properties)) => {
            for (key, node) in properties {
                let nested = existing.get(key).is_some_and(is_object_typed) && is_object_typed(node);
                match (existing.get_mut(key), node) {
                    (Some(Value::Object(current)), Value::Object(next)) if nested => {
                        merge_into(current, next);
                    }
                    _ => {
                        existing.insert(key.clone(), node.clone());
                    }
                }
            }
        }
        _ => {
            acc.insert("properties".to_string(), incoming.clone());
        }
    }
}

fn merge_default(acc: &mut Map<String, Value>, incoming: &Value) {
    match (acc.get_mut("default"), incoming) {
        (Some(Value::Object(existing)), Value::Object(values)) => deep_merge(existing, values),
        _ => {
            acc.insert("default".to_string(), incoming.clone());
        }
    }
}

fn deep_merge(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(next)) => deep_merge(existing, next),
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

fn is_object_typed(node: &Value) -> bool {
    match node.get("type") {
        Some(Value::String(t)) => t == "object",
        Some(Value::Array(types)) => types.iter().any(|t| t == "object"),
        _ => false,
    }
}
