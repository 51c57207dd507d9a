use log::warn;
use serde_json::{Map, Value};

use crate::schema::{Schema, SchemaKind};

/// Initial value for a field.
///
/// A present value (including `null`) is kept and nested objects are
/// completed; a `null` object or array becomes its empty value. An absent
/// value takes the declared `default` (including `null`, `0` or `false`),
/// else the type's empty value.
pub fn initial_value(schema: &Schema, existing: Option<&Value>, required: bool) -> Value {
    match existing {
        Some(value) => fill(schema, value, required),
        None => match &schema.default {
            Some(default) => fill(schema, default, required),
            None => empty_value(schema, required),
        },
    }
}

/// Empty value for a type: filled objects, `[]` (or required padding) for
/// arrays, `null` for everything else.
pub fn empty_value(schema: &Schema, required: bool) -> Value {
    match &schema.kind {
        SchemaKind::Object(_) => fill(schema, &Value::Object(Map::new()), required),
        SchemaKind::Array(array) => {
            let slots = match array.tuple_size() {
                Some(size) if required => size,
                Some(_) => 0,
                None if required => array.min_items.unwrap_or(0),
                None => 0,
            };
            Value::Array(
                (0..slots)
                    .map(|index| match array.item_schema(index) {
                        Some(item) => initial_value(item, None, required),
                        None => Value::Null,
                    })
                    .collect(),
            )
        }
        _ => Value::Null,
    }
}

fn fill(schema: &Schema, value: &Value, required: bool) -> Value {
    match (&schema.kind, value) {
        (SchemaKind::Object(_) | SchemaKind::Array(_), Value::Null) => {
            empty_value(schema, required)
        }
        (SchemaKind::Object(object), Value::Object(map)) => {
            let mut data = Map::new();
            for (key, child) in &object.properties {
                data.insert(
                    key.clone(),
                    initial_value(child, map.get(key), object.is_required(key)),
                );
            }
            for (key, extra) in map {
                if data.contains_key(key) {
                    continue;
                }
                let extra = match object.additional.as_deref() {
                    Some(additional) => fill(additional, extra, false),
                    None => extra.clone(),
                };
                data.insert(key.clone(), extra);
            }
            Value::Object(data)
        }
        (SchemaKind::Array(array), Value::Array(items)) => {
            let mut data: Vec<Value> = items
                .iter()
                .enumerate()
                .map(|(index, item)| match array.item_schema(index) {
                    Some(schema) => fill(schema, item, required),
                    None => item.clone(),
                })
                .collect();

            let slot = |index: usize| match array.item_schema(index) {
                Some(item) => initial_value(item, None, required),
                None => Value::Null,
            };
            match array.tuple_size() {
                Some(size) => {
                    if data.is_empty() && !required {
                        return Value::Array(data);
                    }
                    for index in data.len()..size {
                        data.push(slot(index));
                    }
                    if data.len() > size {
                        warn!("Tuple initial value has more items than allowed ({size})");
                        data.truncate(size);
                    }
                }
                None if required => {
                    for index in data.len()..array.min_items.unwrap_or(0) {
                        data.push(slot(index));
                    }
                }
                None => {}
            }
            Value::Array(data)
        }
        _ => value.clone(),
    }
}
