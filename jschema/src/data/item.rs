use serde_json::{Number, Value};

use crate::{
    error::{Result, SchemaError},
    path::FieldPath,
    schema::{EnumSchema, Schema, SchemaKind},
};

/// Label of the placeholder shown before an enum value is chosen.
pub const ENUM_PLACEHOLDER: &str = "Select...";

/// One editable field: schema-derived metadata plus its current value.
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    /// Property key; `None` for array and tuple items.
    pub key: Option<String>,
    pub path: FieldPath,
    /// Explicit `title`, else the key.
    pub title: String,
    pub description: String,
    pub required: bool,
    /// Whether the field can be deleted by the user (array items and
    /// additional properties).
    pub removable: bool,
    pub default: Option<Value>,
    pub value: Value,
    pub kind: FieldKind,
}

/// Rendering-relevant shape of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Number {
        integer: bool,
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Boolean,
    Enum(EnumField),
    Object {
        children: Vec<FormField>,
        allows_additional: bool,
    },
    Array {
        children: Vec<FormField>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    Tuple {
        children: Vec<FormField>,
        size: usize,
    },
    Null,
    Any,
}

/// Enum variants in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumField {
    pub variants: Vec<Value>,
}

/// One entry of an enum selector.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumOption {
    pub label: String,
    /// `None` for the placeholder.
    pub value: Option<Value>,
    pub selectable: bool,
}

impl EnumField {
    /// Options for a selector showing `selected`.
    ///
    /// While nothing is selected the first option is a non-selectable
    /// [`ENUM_PLACEHOLDER`].
    pub fn options(&self, selected: &Value) -> Vec<EnumOption> {
        let mut options = Vec::with_capacity(self.variants.len() + 1);
        if selected.is_null() {
            options.push(EnumOption {
                label: ENUM_PLACEHOLDER.to_string(),
                value: None,
                selectable: false,
            });
        }
        options.extend(self.variants.iter().map(|variant| EnumOption {
            label: label(variant),
            value: Some(variant.clone()),
            selectable: true,
        }));
        options
    }

    /// Index of `value` among the variants.
    pub fn position(&self, value: &Value) -> Option<usize> {
        self.variants.iter().position(|v| v == value)
    }
}

impl From<&EnumSchema> for EnumField {
    fn from(schema: &EnumSchema) -> Self {
        EnumField {
            variants: schema.values.clone(),
        }
    }
}

impl FormField {
    /// Build the view of the field at `path`. Nested objects and arrays
    /// produce their children recursively.
    pub fn build(
        key: Option<String>,
        path: FieldPath,
        schema: &Schema,
        required: bool,
        removable: bool,
        value: &Value,
    ) -> Self {
        let kind = match &schema.kind {
            SchemaKind::String => FieldKind::String,
            SchemaKind::Number(number) => FieldKind::Number {
                integer: number.integer,
                minimum: number.effective_minimum(),
                maximum: number.effective_maximum(),
            },
            SchemaKind::Boolean => FieldKind::Boolean,
            SchemaKind::Enum(e) => FieldKind::Enum(e.into()),
            SchemaKind::Null => FieldKind::Null,
            SchemaKind::Any => FieldKind::Any,
            SchemaKind::Object(object) => {
                let mut children = Vec::new();
                for (child_key, child) in &object.properties {
                    children.push(Self::build(
                        Some(child_key.clone()),
                        path.child(child_key),
                        child,
                        object.is_required(child_key),
                        false,
                        value.get(child_key).unwrap_or(&Value::Null),
                    ));
                }
                if let (Some(additional), Value::Object(map)) = (object.additional.as_deref(), value)
                {
                    for (extra_key, extra) in map {
                        if object.is_declared(extra_key) {
                            continue;
                        }
                        let mut child = Self::build(
                            Some(extra_key.clone()),
                            path.child(extra_key),
                            additional,
                            false,
                            true,
                            extra,
                        );
                        child.title = extra_key.clone();
                        children.push(child);
                    }
                }
                FieldKind::Object {
                    children,
                    allows_additional: object.additional.is_some(),
                }
            }
            SchemaKind::Array(array) => {
                let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
                let tuple_size = array.tuple_size();
                let children = items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        let item_schema = array.item_schema(index);
                        Self::build(
                            None,
                            path.index(index),
                            item_schema.unwrap_or(&ANY),
                            false,
                            tuple_size.is_none(),
                            item,
                        )
                    })
                    .collect();
                match tuple_size {
                    Some(size) => FieldKind::Tuple { children, size },
                    None => FieldKind::Array {
                        children,
                        min_items: array.min_items,
                        max_items: array.max_items,
                    },
                }
            }
        };

        FormField {
            title: schema.effective_title(key.as_deref()),
            description: schema.description.clone().unwrap_or_default(),
            key,
            path,
            required,
            removable,
            default: schema.default.clone(),
            value: value.clone(),
            kind,
        }
    }

    /// Nested fields of objects, arrays and tuples.
    pub fn children(&self) -> &[FormField] {
        match &self.kind {
            FieldKind::Object { children, .. }
            | FieldKind::Array { children, .. }
            | FieldKind::Tuple { children, .. } => children,
            _ => &[],
        }
    }

    /// Options for enum fields, `None` for other kinds.
    pub fn enum_options(&self) -> Option<Vec<EnumOption>> {
        match &self.kind {
            FieldKind::Enum(e) => Some(e.options(&self.value)),
            _ => None,
        }
    }
}

static ANY: Schema = Schema {
    title: None,
    description: None,
    default: None,
    kind: SchemaKind::Any,
};

/// Check (and for numbers, normalize) a value written into a field.
///
/// Numeric fields turn `""` into `null` and accept numeric strings. No other
/// coercion happens.
pub(crate) fn coerce_value(schema: &Schema, value: Value, path: &FieldPath) -> Result<Value> {
    let mismatch = |expected: &str, actual: &Value| SchemaError::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    };

    match &schema.kind {
        SchemaKind::Number(number) => {
            let expected = if number.integer { "integer" } else { "number" };
            match value {
                Value::Null => Ok(Value::Null),
                Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
                Value::String(ref s) => {
                    parse_number(s.trim(), number.integer).ok_or_else(|| mismatch(expected, &value))
                }
                Value::Number(ref n) if number.integer => {
                    integral(n).ok_or_else(|| mismatch(expected, &value))
                }
                Value::Number(_) => Ok(value),
                other => Err(mismatch(expected, &other)),
            }
        }
        SchemaKind::String => match value {
            Value::Null | Value::String(_) => Ok(value),
            other => Err(mismatch("string", &other)),
        },
        SchemaKind::Boolean => match value {
            Value::Null | Value::Bool(_) => Ok(value),
            other => Err(mismatch("boolean", &other)),
        },
        SchemaKind::Enum(e) => {
            if value.is_null() || e.values.contains(&value) {
                Ok(value)
            } else {
                let variants: Vec<_> = e.values.iter().map(label).collect();
                Err(mismatch(&format!("one of: {variants:?}"), &value))
            }
        }
        SchemaKind::Object(_) => match value {
            Value::Null | Value::Object(_) => Ok(value),
            other => Err(mismatch("object", &other)),
        },
        SchemaKind::Array(_) => match value {
            Value::Null | Value::Array(_) => Ok(value),
            other => Err(mismatch("array", &other)),
        },
        SchemaKind::Null => match value {
            Value::Null => Ok(value),
            other => Err(mismatch("null", &other)),
        },
        SchemaKind::Any => Ok(value),
    }
}

fn parse_number(s: &str, integer: bool) -> Option<Value> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::from(i));
    }
    let f = s.parse::<f64>().ok()?;
    if integer {
        return integral(&Number::from_f64(f)?);
    }
    Number::from_f64(f).map(Value::Number)
}

fn integral(n: &Number) -> Option<Value> {
    if n.is_i64() || n.is_u64() {
        return Some(Value::Number(n.clone()));
    }
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(Value::from(f as i64))
    } else {
        None
    }
}

fn label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
