use log::{debug, warn};
use serde_json::{Map, Value};

use super::{merge::merge_into, resolve::resolve_ref};
use crate::error::{Result, SchemaError};

/// Arguments filled in by the workflow engine for legacy (v1) tasks.
pub const IGNORED_V1: &[&str] = &["input_paths", "output_path", "metadata", "component"];

/// Arguments filled in by the workflow engine for v2 tasks.
pub const IGNORED_V2: &[&str] = &["zarr_url", "zarr_urls", "init_args", "zarr_dir"];

/// Produce a `$ref`-free and `allOf`-free copy of `schema`.
///
/// The input is never modified. Positions whose reference cannot be
/// resolved become `null`; reference cycles are reported as
/// [`SchemaError::ReferenceCycle`].
pub fn normalize(schema: &Value) -> Result<Value> {
    Normalizer {
        root: schema,
        resolving: Vec::new(),
    }
    .node(schema)
}

/// Remove `ignored` top-level properties, then normalize.
pub fn adapt_schema<S: AsRef<str>>(schema: &Value, ignored: &[S]) -> Result<Value> {
    let stripped = strip_ignored_properties(schema, ignored);
    normalize(&stripped)
}

/// Copy of `schema` without the `ignored` top-level properties and their
/// `required` entries.
pub fn strip_ignored_properties<S: AsRef<str>>(schema: &Value, ignored: &[S]) -> Value {
    let mut stripped = schema.clone();
    let is_ignored = |key: &str| ignored.iter().any(|i| i.as_ref() == key);

    if let Some(Value::Object(properties)) = stripped.get_mut("properties") {
        properties.retain(|key, _| !is_ignored(key));
    }
    if let Some(Value::Array(required)) = stripped.get_mut("required") {
        required.retain(|key| !key.as_str().is_some_and(is_ignored));
    }
    stripped
}

struct Normalizer<'a> {
    root: &'a Value,
    resolving: Vec<String>,
}

impl<'a> Normalizer<'a> {
    fn node(&mut self, node: &Value) -> Result<Value> {
        let Value::Object(map) = node else {
            return Ok(node.clone());
        };

        let reference = map.get("$ref").and_then(Value::as_str);
        let branches = map.get("allOf").and_then(Value::as_array);
        if reference.is_none() && branches.is_none() {
            return Ok(Value::Object(self.own_keys(map)?));
        }

        let mut merged = Map::new();
        if let Some(reference) = reference {
            match self.reference(reference)? {
                Value::Null => return Ok(Value::Null),
                Value::Object(target) => merge_into(&mut merged, &target),
                _ => {}
            }
        }
        for branch in branches.into_iter().flatten() {
            match self.node(branch)? {
                Value::Null => return Ok(Value::Null),
                Value::Object(fragment) => merge_into(&mut merged, &fragment),
                _ => {}
            }
        }

        overlay(&mut merged, self.own_keys(map)?);
        Ok(Value::Object(merged))
    }

    fn reference(&mut self, reference: &str) -> Result<Value> {
        if self.resolving.iter().any(|r| r == reference) {
            return Err(SchemaError::ReferenceCycle {
                reference: reference.to_string(),
            });
        }
        let Some(target) = resolve_ref(reference, self.root) else {
            warn!("Unable to resolve reference {reference}");
            return Ok(Value::Null);
        };

        debug!("resolving {reference}");
        self.resolving.push(reference.to_string());
        let resolved = self.node(target);
        self.resolving.pop();
        resolved
    }

    /// The node's own keywords with nested schema positions normalized.
    fn own_keys(&mut self, map: &Map<String, Value>) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        for (key, value) in map {
            let value = match key.as_str() {
                "$ref" | "allOf" => continue,
                "properties" => match value {
                    Value::Object(properties) => {
                        let mut normalized = Map::new();
                        for (name, property) in properties {
                            normalized.insert(name.clone(), self.node(property)?);
                        }
                        Value::Object(normalized)
                    }
                    _ => value.clone(),
                },
                "items" | "prefixItems" | "additionalProperties" => match value {
                    Value::Array(items) => Value::Array(
                        items
                            .iter()
                            .map(|item| self.node(item))
                            .collect::<Result<_>>()?,
                    ),
                    _ => self.node(value)?,
                },
                _ => value.clone(),
            };
            out.insert(key.clone(), value);
        }
        Ok(out)
    }
}

/// Apply the node's own keywords over the resolved/merged base. Own keys win;
/// `properties` and `required` are unioned.
fn overlay(base: &mut Map<String, Value>, own: Map<String, Value>) {
    for (key, value) in own {
        let replacement = match (base.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(properties)) if key == "properties" => {
                existing.extend(properties);
                None
            }
            (Some(Value::Array(existing)), Value::Array(required)) if key == "required" => {
                for name in required {
                    if !existing.contains(&name) {
                        existing.push(name);
                    }
                }
                None
            }
            (_, value) => Some(value),
        };
        if let Some(value) = replacement {
            base.insert(key, value);
        }
    }
}
