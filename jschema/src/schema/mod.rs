//! Schema normalization and the typed schema model.
//!
//! Raw documents go through [`normalize`] (or [`adapt_schema`]) which removes
//! every `$ref` and `allOf`. The normalized JSON is then parsed into a
//! [`Schema`] tree whose [`SchemaKind`] selects one record shape per type.

/// `allOf` fragment merging.
pub mod merge;

/// `$ref`/`allOf` elimination over a whole document.
pub mod normalize;

/// Local `$ref` pointer resolution.
pub mod resolve;

use log::warn;
use serde_json::{Map, Value};

use crate::{
    error::{Result, SchemaError},
    path::FieldPath,
};

pub use merge::merge_all_of;
pub use normalize::{IGNORED_V1, IGNORED_V2, adapt_schema, normalize, strip_ignored_properties};
pub use resolve::resolve_ref;

/// One node of a normalized schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub title: Option<String>,
    pub description: Option<String>,
    /// `Some(Value::Null)` is an explicit `null` default, `None` means no
    /// default was declared.
    pub default: Option<Value>,
    pub kind: SchemaKind,
}

/// Type-specific part of a [`Schema`].
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    String,
    Number(NumberSchema),
    Boolean,
    Enum(EnumSchema),
    Object(ObjectSchema),
    Array(ArraySchema),
    Null,
    /// No `type` and nothing to infer one from.
    Any,
}

/// Numeric constraints for `number` and `integer` nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberSchema {
    pub integer: bool,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
}

impl NumberSchema {
    /// Inclusive lower bound: `minimum`, else `exclusiveMinimum + 1`.
    ///
    /// Exclusive bounds are converted with integer steps, also for `number`.
    pub fn effective_minimum(&self) -> Option<f64> {
        self.minimum.or(self.exclusive_minimum.map(|v| v + 1.0))
    }

    /// Inclusive upper bound: `maximum`, else `exclusiveMaximum - 1`.
    pub fn effective_maximum(&self) -> Option<f64> {
        self.maximum.or(self.exclusive_maximum.map(|v| v - 1.0))
    }
}

/// A node restricted to a list of literal values.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    pub values: Vec<Value>,
    /// The declared `type`, if any (`None` for `type: null` enums).
    pub value_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    /// Declared properties in declaration order.
    pub properties: Vec<(String, Schema)>,
    pub required: Vec<String>,
    /// Schema for keys outside `properties`; `None` when extra keys are not
    /// editable.
    pub additional: Option<Box<Schema>>,
}

impl ObjectSchema {
    pub fn property(&self, key: &str) -> Option<&Schema> {
        self.properties
            .iter()
            .find_map(|(name, schema)| (name == key).then_some(schema))
    }

    pub fn is_declared(&self, key: &str) -> bool {
        self.property(key).is_some()
    }

    pub fn is_required(&self, key: &str) -> bool {
        self.required.iter().any(|r| r == key)
    }

    /// Schema applying to `key`, either declared or additional.
    pub fn schema_for(&self, key: &str) -> Option<&Schema> {
        self.property(key).or(self.additional.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArraySchema {
    pub items: Option<Box<Schema>>,
    /// Positional item schemas (`prefixItems`, or a draft-07 `items` array).
    pub prefix_items: Vec<Schema>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

impl ArraySchema {
    /// Fixed length when the array is edited as a tuple.
    pub fn tuple_size(&self) -> Option<usize> {
        match (self.min_items, self.max_items) {
            (Some(min), Some(max)) if min == max => Some(min),
            _ if !self.prefix_items.is_empty() => Some(self.prefix_items.len()),
            _ => None,
        }
    }

    pub fn is_tuple(&self) -> bool {
        self.tuple_size().is_some()
    }

    /// Schema for the item at `index`.
    pub fn item_schema(&self, index: usize) -> Option<&Schema> {
        self.prefix_items.get(index).or(self.items.as_deref())
    }
}

impl Schema {
    /// The schema accepting anything.
    pub fn any() -> Self {
        Schema {
            title: None,
            description: None,
            default: None,
            kind: SchemaKind::Any,
        }
    }

    /// Parse a normalized schema node. `path` is used in error messages.
    ///
    /// An absent node (`null`, left behind by an unresolvable `$ref`) is an
    /// authoring error and yields [`SchemaError::UnresolvedNode`].
    pub fn parse(value: &Value, path: &FieldPath) -> Result<Self> {
        match value {
            Value::Null => Err(SchemaError::UnresolvedNode {
                path: path.to_string(),
            }),
            Value::Bool(_) => Ok(Schema::any()),
            Value::Object(map) => Self::parse_object(map, path),
            other => Err(SchemaError::InvalidSchema(format!(
                "schema node at `{path}` is not an object: {other}"
            ))),
        }
    }

    fn parse_object(map: &Map<String, Value>, path: &FieldPath) -> Result<Self> {
        let title = map.get("title").and_then(Value::as_str).map(String::from);
        let description = map
            .get("description")
            .and_then(Value::as_str)
            .map(String::from);
        let default = map.get("default").cloned();
        let ty = declared_type(map);

        let kind = if let Some(Value::Array(values)) = map.get("enum") {
            SchemaKind::Enum(EnumSchema {
                values: values.clone(),
                value_type: ty.filter(|t| *t != "null").map(String::from),
            })
        } else {
            match ty {
                Some("string") => SchemaKind::String,
                Some("number") => SchemaKind::Number(parse_number(map, false)),
                Some("integer") => SchemaKind::Number(parse_number(map, true)),
                Some("boolean") => SchemaKind::Boolean,
                Some("object") => SchemaKind::Object(parse_properties(map, path)?),
                Some("array") => SchemaKind::Array(parse_items(map, path)?),
                Some("null") => SchemaKind::Null,
                None if map.contains_key("properties") => {
                    SchemaKind::Object(parse_properties(map, path)?)
                }
                None if map.contains_key("items") || map.contains_key("prefixItems") => {
                    SchemaKind::Array(parse_items(map, path)?)
                }
                None => SchemaKind::Any,
                Some(other) => {
                    warn!("Unsupported type {other:?} at `{path}`, editing as untyped");
                    SchemaKind::Any
                }
            }
        };

        Ok(Schema {
            title,
            description,
            default,
            kind,
        })
    }

    /// Display label: the explicit `title`, else the property key.
    pub fn effective_title(&self, key: Option<&str>) -> String {
        self.title
            .clone()
            .or_else(|| key.map(String::from))
            .unwrap_or_default()
    }

    /// Walk to the schema applying at `path`.
    pub fn at(&self, path: &FieldPath) -> Option<&Schema> {
        let mut schema = self;
        for segment in path.segments() {
            schema = match &schema.kind {
                SchemaKind::Object(object) => object.schema_for(segment)?,
                SchemaKind::Array(array) => array.item_schema(segment.parse().ok()?)?,
                _ => return None,
            };
        }
        Some(schema)
    }

    /// Short name of the node type, as shown to users.
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            SchemaKind::String => "string",
            SchemaKind::Number(n) if n.integer => "integer",
            SchemaKind::Number(_) => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Enum(_) => "enum",
            SchemaKind::Object(_) => "object",
            SchemaKind::Array(a) if a.is_tuple() => "tuple",
            SchemaKind::Array(_) => "array",
            SchemaKind::Null => "null",
            SchemaKind::Any => "any",
        }
    }
}

impl TryFrom<&Value> for Schema {
    type Error = SchemaError;

    fn try_from(value: &Value) -> Result<Self> {
        Schema::parse(value, &FieldPath::root())
    }
}

/// `type` keyword, picking the first non-null entry of a type list.
fn declared_type(map: &Map<String, Value>) -> Option<&str> {
    match map.get("type")? {
        Value::String(ty) => Some(ty.as_str()),
        Value::Array(types) => {
            let mut names = types.iter().filter_map(Value::as_str);
            let first = names.clone().next();
            names.find(|t| *t != "null").or(first)
        }
        _ => None,
    }
}

fn parse_number(map: &Map<String, Value>, integer: bool) -> NumberSchema {
    let bound = |key: &str| map.get(key).and_then(Value::as_f64);
    NumberSchema {
        integer,
        minimum: bound("minimum"),
        maximum: bound("maximum"),
        exclusive_minimum: bound("exclusiveMinimum"),
        exclusive_maximum: bound("exclusiveMaximum"),
    }
}

fn parse_properties(map: &Map<String, Value>, path: &FieldPath) -> Result<ObjectSchema> {
    let mut properties = Vec::new();
    if let Some(Value::Object(declared)) = map.get("properties") {
        for (key, node) in declared {
            properties.push((key.clone(), Schema::parse(node, &path.child(key))?));
        }
    }

    let required = map
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).map(String::from).collect())
        .unwrap_or_default();

    let additional = match map.get("additionalProperties") {
        Some(Value::Bool(true)) => Some(Box::new(Schema::any())),
        Some(node @ Value::Object(_)) => {
            Some(Box::new(Schema::parse(node, &path.child("additionalProperties"))?))
        }
        _ => None,
    };

    Ok(ObjectSchema {
        properties,
        required,
        additional,
    })
}

fn parse_items(map: &Map<String, Value>, path: &FieldPath) -> Result<ArraySchema> {
    let mut items = None;
    let mut prefix_items = Vec::new();

    match map.get("items") {
        Some(Value::Array(positional)) => {
            for (index, node) in positional.iter().enumerate() {
                prefix_items.push(Schema::parse(node, &path.index(index))?);
            }
        }
        Some(node) => items = Some(Box::new(Schema::parse(node, &path.child("items"))?)),
        None => {}
    }
    if let Some(Value::Array(positional)) = map.get("prefixItems") {
        prefix_items.clear();
        for (index, node) in positional.iter().enumerate() {
            prefix_items.push(Schema::parse(node, &path.index(index))?);
        }
    }

    let count = |key: &str| {
        map.get(key)
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
    };
    Ok(ArraySchema {
        items,
        prefix_items,
        min_items: count("minItems"),
        max_items: count("maxItems"),
    })
}
