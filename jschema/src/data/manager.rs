use std::fmt;

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::{
    data::{
        initial::initial_value,
        item::{FormField, coerce_value},
    },
    error::{Result, SchemaError},
    options::FormOptions,
    path::FieldPath,
    schema::{ArraySchema, ObjectSchema, Schema, SchemaKind, adapt_schema},
    utils::strip_null_and_empty,
    validator::{SchemaDraft, SchemaValidator},
};

/// Callback invoked with the new "has unsaved changes" state.
pub type ChangeListener = Box<dyn FnMut(bool)>;

/// Binds a normalized schema to the data object being edited.
///
/// All reads and writes of the data go through the manager, which keeps the
/// data shaped after the schema and tracks unsaved changes.
pub struct SchemaManager {
    schema: Schema,
    normalized: Value,
    data: Value,
    draft: SchemaDraft,
    has_unsaved_changes: bool,
    on_change: Option<ChangeListener>,
}

impl SchemaManager {
    /// Build a manager with default [`FormOptions`].
    ///
    /// # Errors
    ///
    /// - [`SchemaError::SchemaUndefined`] when `schema` is `None`.
    /// - [`SchemaError::DataUndefined`] when the schema declares properties
    ///   and `data` is `None`.
    /// - [`SchemaError::UnresolvedNode`] when a property's `$ref` cannot be
    ///   resolved.
    pub fn new(schema: Option<Value>, data: Option<Value>) -> Result<Self> {
        Self::with_options(schema, data, &FormOptions::default())
    }

    /// Build a manager, stripping ignored properties and optionally
    /// compiling the schema first.
    pub fn with_options(
        schema: Option<Value>,
        data: Option<Value>,
        options: &FormOptions,
    ) -> Result<Self> {
        let schema = schema.ok_or(SchemaError::SchemaUndefined)?;
        let normalized = adapt_schema(&schema, &options.ignored_properties)?;
        let has_properties = normalized
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(|p| !p.is_empty());
        if has_properties && data.is_none() {
            return Err(SchemaError::DataUndefined);
        }

        if options.validate_schema {
            SchemaValidator::new(options.draft, false).try_load_schema(&normalized)?;
        }
        let typed = Schema::try_from(&normalized)?;

        let data = match data {
            None => Value::Object(Map::new()),
            Some(data @ Value::Object(_)) => data,
            Some(other) => {
                return Err(SchemaError::TypeMismatch {
                    path: String::new(),
                    expected: "object".to_string(),
                    actual: other.to_string(),
                });
            }
        };
        let data = initial_value(&typed, Some(&data), true);
        debug!("form data initialized: {data}");

        Ok(SchemaManager {
            schema: typed,
            normalized,
            data,
            draft: options.draft,
            has_unsaved_changes: false,
            on_change: None,
        })
    }

    /// The typed, normalized schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The normalized schema as JSON.
    pub fn normalized_schema(&self) -> &Value {
        &self.normalized
    }

    /// The working data object.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Value at a `###`-separated path.
    pub fn get_value(&self, path: &str) -> Option<&Value> {
        value_at(&self.data, &FieldPath::parse(path))
    }

    /// Mutable access to the value at `path`. The session is marked as
    /// changed.
    pub fn get_value_mut(&mut self, path: &str) -> Option<&mut Value> {
        let path = FieldPath::parse(path);
        value_at(&self.data, &path)?;
        self.changes_not_saved();
        value_at_mut(&mut self.data, &path)
    }

    /// Write a field value.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnknownPath`] when no field exists at `path`,
    /// [`SchemaError::TypeMismatch`] when the value does not fit the field.
    pub fn set_value(&mut self, path: &str, value: Value) -> Result<()> {
        let path = FieldPath::parse(path);
        let Some((parent, key)) = path.split_last() else {
            return Err(SchemaError::InvalidOperation {
                path: String::new(),
                reason: "the root object cannot be replaced".to_string(),
            });
        };
        let schema = self.schema.at(&path).ok_or_else(|| unknown(&path))?;
        let value = coerce_value(schema, value, &path)?;
        let value = initial_value(schema, Some(&value), self.is_required(&path));

        match value_at_mut(&mut self.data, &parent) {
            Some(Value::Object(map)) => {
                map.insert(key.to_string(), value);
            }
            Some(Value::Array(items)) => {
                let slot = key
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get_mut(index))
                    .ok_or_else(|| unknown(&path))?;
                *slot = value;
            }
            _ => return Err(unknown(&path)),
        }
        self.changes_not_saved();
        Ok(())
    }

    /// The data as a plain object limited to the schema's declared
    /// properties (and additional ones where the schema allows them).
    pub fn get_arguments(&self) -> Value {
        match &self.schema.kind {
            SchemaKind::Object(object) => project_object(object, &self.data),
            _ => Value::Object(Map::new()),
        }
    }

    /// Views of the top-level fields, in declaration order.
    pub fn fields(&self) -> Vec<FormField> {
        FormField::build(None, FieldPath::root(), &self.schema, true, false, &self.data)
            .children()
            .to_vec()
    }

    /// View of the field at `path`.
    pub fn field(&self, path: &str) -> Result<FormField> {
        let path = FieldPath::parse(path);
        let schema = self.schema.at(&path).ok_or_else(|| unknown(&path))?;
        let value = value_at(&self.data, &path).unwrap_or(&Value::Null);

        let (key, removable) = match path.split_last() {
            None => (None, false),
            Some((parent, key)) => match self.schema.at(&parent).map(|s| &s.kind) {
                Some(SchemaKind::Array(array)) => (None, !array.is_tuple()),
                Some(SchemaKind::Object(object)) => {
                    (Some(key.to_string()), !object.is_declared(key))
                }
                _ => (Some(key.to_string()), false),
            },
        };
        let mut field = FormField::build(
            key,
            path.clone(),
            schema,
            self.is_required(&path),
            removable,
            value,
        );
        if removable && field.key.is_some() {
            field.title = path.key().unwrap_or_default().to_string();
        }
        Ok(field)
    }

    /// Whether the field at `path` is listed in its parent's `required`.
    pub fn is_required(&self, path: &FieldPath) -> bool {
        let Some((parent, key)) = path.split_last() else {
            return true;
        };
        match self.schema.at(&parent).map(|s| &s.kind) {
            Some(SchemaKind::Object(object)) => object.is_required(key),
            _ => false,
        }
    }

    /// Append a new item (initialized from the item schema) to the array at
    /// `path`, returning its index.
    pub fn add_array_item(&mut self, path: &str) -> Result<usize> {
        let path = FieldPath::parse(path);
        let array = self.list_schema(&path)?;
        let item = match array.items.as_deref() {
            Some(items) => initial_value(items, None, false),
            None => Value::Null,
        };
        let max_items = array.max_items;

        let items = self.array_mut(&path)?;
        if max_items.is_some_and(|max| items.len() >= max) {
            warn!("Attempted to add an item beyond maxItems at {path}");
            return Err(invalid(&path, "the maximum number of items has been reached"));
        }
        items.push(item);
        let index = items.len() - 1;
        self.changes_not_saved();
        Ok(index)
    }

    /// Remove and return the item at `index`.
    pub fn remove_array_item(&mut self, path: &str, index: usize) -> Result<Value> {
        let path = FieldPath::parse(path);
        self.list_schema(&path)?;
        let items = self.array_mut(&path)?;
        if index >= items.len() {
            return Err(invalid(&path, &format!("no item at index {index}")));
        }
        let removed = items.remove(index);
        self.changes_not_saved();
        Ok(removed)
    }

    /// Swap the item at `index` with the previous one. No-op for the first
    /// item.
    pub fn move_array_item_up(&mut self, path: &str, index: usize) -> Result<()> {
        if index == 0 {
            return self.check_item(path, index);
        }
        self.swap_items(path, index - 1, index)
    }

    /// Swap the item at `index` with the next one. No-op for the last item.
    pub fn move_array_item_down(&mut self, path: &str, index: usize) -> Result<()> {
        self.check_item(path, index)?;
        if index + 1 == self.array_len(path)? {
            return Ok(());
        }
        self.swap_items(path, index, index + 1)
    }

    /// Reset a scalar item to `null`.
    pub fn clear_array_item(&mut self, path: &str, index: usize) -> Result<()> {
        let item_path = FieldPath::parse(path).index(index);
        let item_schema = self.schema.at(&item_path).ok_or_else(|| unknown(&item_path))?;
        if matches!(
            item_schema.kind,
            SchemaKind::Object(_) | SchemaKind::Array(_)
        ) {
            return Err(invalid(&item_path, "only scalar items can be cleared"));
        }
        self.check_item(path, index)?;
        self.set_value(&item_path.to_string(), Value::Null)
    }

    /// Fill an empty tuple with one slot per position, taken from the tuple
    /// default or from the item schemas.
    pub fn add_tuple(&mut self, path: &str) -> Result<()> {
        let path = FieldPath::parse(path);
        let schema = self.schema.at(&path).ok_or_else(|| unknown(&path))?;
        let SchemaKind::Array(array) = &schema.kind else {
            return Err(invalid(&path, "not a tuple"));
        };
        let Some(size) = array.tuple_size() else {
            return Err(invalid(&path, "not a tuple"));
        };
        let defaults = schema.default.as_ref().and_then(Value::as_array);
        let value: Vec<Value> = (0..size)
            .map(|index| match array.item_schema(index) {
                Some(item) => {
                    initial_value(item, defaults.and_then(|d| d.get(index)), false)
                }
                None => Value::Null,
            })
            .collect();
        self.set_value(&path.to_string(), Value::Array(value))
    }

    /// Empty the tuple at `path`.
    pub fn remove_tuple(&mut self, path: &str) -> Result<()> {
        let field_path = FieldPath::parse(path);
        match self.schema.at(&field_path).map(|s| &s.kind) {
            Some(SchemaKind::Array(array)) if array.is_tuple() => {
                self.set_value(path, Value::Array(Vec::new()))
            }
            Some(_) => Err(invalid(&field_path, "not a tuple")),
            None => Err(unknown(&field_path)),
        }
    }

    /// Add an additional property named `key` to the object at `path`
    /// (`""` is the root object).
    pub fn add_property(&mut self, path: &str, key: &str, value: Option<Value>) -> Result<()> {
        let path = FieldPath::parse(path);
        let object = self.object_schema(&path)?;
        let Some(additional) = object.additional.as_deref() else {
            return Err(invalid(&path, "additional properties are not allowed"));
        };
        if key.is_empty() {
            return Err(invalid(&path, "Schema property has no name"));
        }
        let exists = object.is_declared(key)
            || value_at(&self.data, &path).is_some_and(|v| v.get(key).is_some());
        if exists {
            return Err(invalid(
                &path,
                "Schema property already has a property with the same name",
            ));
        }

        let child = path.child(key);
        let value = match value {
            Some(value) => Some(coerce_value(additional, value, &child)?),
            None => None,
        };
        let value = initial_value(additional, value.as_ref(), false);
        self.object_mut(&path)?.insert(key.to_string(), value);
        self.changes_not_saved();
        Ok(())
    }

    /// Remove the additional property `key` from the object at `path`.
    pub fn remove_property(&mut self, path: &str, key: &str) -> Result<Value> {
        let path = FieldPath::parse(path);
        let object = self.object_schema(&path)?;
        if object.additional.is_none() {
            return Err(invalid(&path, "additional properties are not allowed"));
        }
        if object.is_declared(key) {
            return Err(invalid(&path.child(key), "declared properties cannot be removed"));
        }

        let map = self.object_mut(&path)?;
        let removed = map.get(key).cloned().ok_or_else(|| unknown(&path.child(key)))?;
        map.retain(|k, _| k != key);
        self.changes_not_saved();
        Ok(removed)
    }

    /// Validate the current arguments against the schema, ignoring unset
    /// optional values.
    ///
    /// # Errors
    ///
    /// [`SchemaError::InvalidData`] listing every violation.
    pub fn validate(&self) -> Result<()> {
        let mut validator = SchemaValidator::new(self.draft, true);
        validator.try_load_schema(&self.normalized)?;
        let data = strip_null_and_empty(&self.get_arguments());
        match validator.errors(&data) {
            Some(errors) if !errors.is_empty() => Err(SchemaError::InvalidData { errors }),
            _ => Ok(()),
        }
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    /// Mark the current data as persisted.
    pub fn mark_saved(&mut self) {
        self.has_unsaved_changes = false;
        self.notify();
    }

    /// Register a callback receiving the unsaved-changes flag after every
    /// edit and save.
    pub fn set_change_listener(&mut self, listener: impl FnMut(bool) + 'static) {
        self.on_change = Some(Box::new(listener));
    }

    fn changes_not_saved(&mut self) {
        self.has_unsaved_changes = true;
        self.notify();
    }

    fn notify(&mut self) {
        let state = self.has_unsaved_changes;
        if let Some(listener) = self.on_change.as_mut() {
            listener(state);
        }
    }

    fn object_schema(&self, path: &FieldPath) -> Result<&ObjectSchema> {
        match self.schema.at(path).map(|s| &s.kind) {
            Some(SchemaKind::Object(object)) => Ok(object),
            Some(_) => Err(invalid(path, "not an object")),
            None => Err(unknown(path)),
        }
    }

    fn list_schema(&self, path: &FieldPath) -> Result<&ArraySchema> {
        match self.schema.at(path).map(|s| &s.kind) {
            Some(SchemaKind::Array(array)) if !array.is_tuple() => Ok(array),
            Some(_) => Err(invalid(path, "not an array")),
            None => Err(unknown(path)),
        }
    }

    fn object_mut(&mut self, path: &FieldPath) -> Result<&mut Map<String, Value>> {
        let value = value_at_mut(&mut self.data, path).ok_or_else(|| unknown(path))?;
        if value.is_null() {
            *value = Value::Object(Map::new());
        }
        value.as_object_mut().ok_or_else(|| invalid(path, "value is not an object"))
    }

    fn array_mut(&mut self, path: &FieldPath) -> Result<&mut Vec<Value>> {
        let value = value_at_mut(&mut self.data, path).ok_or_else(|| unknown(path))?;
        if value.is_null() {
            *value = Value::Array(Vec::new());
        }
        value.as_array_mut().ok_or_else(|| invalid(path, "value is not an array"))
    }

    fn array_len(&self, path: &str) -> Result<usize> {
        let path = FieldPath::parse(path);
        self.list_schema(&path)?;
        Ok(value_at(&self.data, &path)
            .and_then(Value::as_array)
            .map_or(0, Vec::len))
    }

    fn check_item(&self, path: &str, index: usize) -> Result<()> {
        if index < self.array_len(path)? {
            Ok(())
        } else {
            Err(invalid(&FieldPath::parse(path), &format!("no item at index {index}")))
        }
    }

    fn swap_items(&mut self, path: &str, a: usize, b: usize) -> Result<()> {
        self.check_item(path, b)?;
        let field_path = FieldPath::parse(path);
        self.array_mut(&field_path)?.swap(a, b);
        self.changes_not_saved();
        Ok(())
    }
}

impl fmt::Debug for SchemaManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaManager")
            .field("schema", &self.schema)
            .field("data", &self.data)
            .field("draft", &self.draft)
            .field("has_unsaved_changes", &self.has_unsaved_changes)
            .finish_non_exhaustive()
    }
}

fn value_at<'v>(data: &'v Value, path: &FieldPath) -> Option<&'v Value> {
    let mut value = data;
    for segment in path.segments() {
        value = match value {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(value)
}

fn value_at_mut<'v>(data: &'v mut Value, path: &FieldPath) -> Option<&'v mut Value> {
    let mut value = data;
    for segment in path.segments() {
        value = match value {
            Value::Object(map) => map.get_mut(segment)?,
            Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(value)
}

fn project(schema: &Schema, value: &Value) -> Value {
    match (&schema.kind, value) {
        (SchemaKind::Object(object), Value::Object(_)) => project_object(object, value),
        (SchemaKind::Array(array), Value::Array(items)) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(index, item)| match array.item_schema(index) {
                    Some(item_schema) => project(item_schema, item),
                    None => item.clone(),
                })
                .collect(),
        ),
        _ => value.clone(),
    }
}

fn project_object(object: &ObjectSchema, value: &Value) -> Value {
    let mut arguments = Map::new();
    let Value::Object(map) = value else {
        return Value::Object(arguments);
    };
    for (key, schema) in &object.properties {
        if let Some(child) = map.get(key) {
            arguments.insert(key.clone(), project(schema, child));
        }
    }
    if let Some(additional) = object.additional.as_deref() {
        for (key, child) in map {
            if !object.is_declared(key) {
                arguments.insert(key.clone(), project(additional, child));
            }
        }
    }
    Value::Object(arguments)
}

fn unknown(path: &FieldPath) -> SchemaError {
    SchemaError::UnknownPath {
        path: path.to_string(),
    }
}

fn invalid(path: &FieldPath, reason: &str) -> SchemaError {
    SchemaError::InvalidOperation {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::data::item::FieldKind;
    use serde_json::json;

    fn task_schema() -> Value {
        json!({
            "title": "ThresholdTask",
            "type": "object",
            "properties": {
                "threshold": {"type": "integer", "exclusiveMinimum": 5, "exclusiveMaximum": 10},
                "label": {"type": "string", "default": null},
                "level": {"type": "integer", "default": 0},
                "mode": {"enum": ["fast", "accurate"]},
                "channels": {"type": "array", "items": {"type": "string"}, "maxItems": 2},
                "window": {"type": "array", "items": {"type": "integer"}, "minItems": 2, "maxItems": 2, "default": [3, 4]},
                "extra": {"type": "object", "additionalProperties": {"type": "number"}},
                "nested": {
                    "type": "object",
                    "properties": {"flag": {"type": "boolean", "default": true}}
                }
            },
            "required": ["threshold"]
        })
    }

    fn manager() -> SchemaManager {
        SchemaManager::new(Some(task_schema()), Some(json!({}))).unwrap()
    }

    #[test]
    fn test_missing_schema_or_data() {
        assert_eq!(
            SchemaManager::new(None, Some(json!({}))).unwrap_err(),
            SchemaError::SchemaUndefined
        );
        let err = SchemaManager::new(Some(task_schema()), None).unwrap_err();
        assert_eq!(err, SchemaError::DataUndefined);
        assert_eq!(err.to_string(), "Schema data is undefined");

        let empty = SchemaManager::new(Some(json!({})), None).unwrap();
        assert_eq!(empty.data(), &json!({}));
        assert_eq!(empty.get_arguments(), json!({}));

        assert!(matches!(
            SchemaManager::new(Some(task_schema()), Some(json!([1]))),
            Err(SchemaError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_data_check_uses_the_prepared_schema() {
        let referenced = json!({
            "$ref": "#/definitions/Args",
            "definitions": {"Args": {"type": "object", "properties": {"a": {"type": "string"}}}}
        });
        assert_eq!(
            SchemaManager::new(Some(referenced), None).unwrap_err(),
            SchemaError::DataUndefined
        );

        let only_ignored = json!({
            "type": "object",
            "properties": {"zarr_url": {"type": "string"}},
            "required": ["zarr_url"]
        });
        let manager =
            SchemaManager::with_options(Some(only_ignored), None, &FormOptions::v2()).unwrap();
        assert_eq!(manager.get_arguments(), json!({}));
    }

    #[test]
    fn test_null_object_accepts_child_edits() {
        let schema = json!({
            "type": "object",
            "properties": {
                "nested": {"type": "object", "properties": {"flag": {"type": "boolean"}}}
            }
        });
        let mut manager = SchemaManager::new(Some(schema), Some(json!({"nested": null}))).unwrap();
        assert_eq!(manager.data(), &json!({"nested": {"flag": null}}));

        manager.set_value("nested###flag", json!(true)).unwrap();
        assert_eq!(manager.get_arguments(), json!({"nested": {"flag": true}}));
        manager.set_value("nested", Value::Null).unwrap();
        assert_eq!(manager.field("nested###flag").unwrap().value, Value::Null);
        manager.set_value("nested###flag", json!(false)).unwrap();
        assert_eq!(manager.get_value("nested###flag"), Some(&json!(false)));
    }

    #[test]
    fn test_unresolved_property_fails() {
        let schema = json!({
            "type": "object",
            "properties": {"broken": {"$ref": "#/definitions/Missing"}}
        });
        assert_eq!(
            SchemaManager::new(Some(schema), Some(json!({}))).unwrap_err(),
            SchemaError::UnresolvedNode {
                path: "broken".to_string()
            }
        );
    }

    #[test]
    fn test_initial_values() {
        let manager = manager();
        assert_eq!(manager.get_value("threshold"), Some(&Value::Null));
        assert_eq!(manager.get_value("label"), Some(&Value::Null));
        assert_eq!(manager.get_value("level"), Some(&json!(0)));
        assert_eq!(manager.get_value("channels"), Some(&json!([])));
        assert_eq!(manager.get_value("window"), Some(&json!([3, 4])));
        assert_eq!(manager.get_value("nested###flag"), Some(&json!(true)));
        assert!(!manager.has_unsaved_changes());
    }

    #[test]
    fn test_arguments_without_edits_match_properties() {
        let manager = SchemaManager::new(
            Some(task_schema()),
            Some(json!({"threshold": 7, "stale": "dropped", "extra": {"gain": 1.5}})),
        )
        .unwrap();
        let arguments = manager.get_arguments();
        let keys: Vec<_> = arguments.as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            keys,
            ["threshold", "label", "level", "mode", "channels", "window", "extra", "nested"]
        );
        assert_eq!(arguments["threshold"], json!(7));
        assert_eq!(arguments["extra"], json!({"gain": 1.5}));
        assert_eq!(manager.get_value("stale"), Some(&json!("dropped")));
    }

    #[test]
    fn test_field_bounds_and_titles() {
        let manager = manager();
        let threshold = manager.field("threshold").unwrap();
        assert_eq!(threshold.title, "threshold");
        assert!(threshold.required);
        assert_eq!(
            threshold.kind,
            FieldKind::Number {
                integer: true,
                minimum: Some(6.0),
                maximum: Some(9.0)
            }
        );
        assert!(matches!(manager.field("window").unwrap().kind, FieldKind::Tuple { size: 2, .. }));
        assert_eq!(manager.fields().len(), 8);
        assert!(matches!(manager.field("nope"), Err(SchemaError::UnknownPath { .. })));
    }

    #[test]
    fn test_set_value_coercion() {
        let mut manager = manager();
        manager.set_value("threshold", json!("8")).unwrap();
        assert_eq!(manager.get_value("threshold"), Some(&json!(8)));
        manager.set_value("threshold", json!("")).unwrap();
        assert_eq!(manager.get_value("threshold"), Some(&Value::Null));
        assert!(matches!(
            manager.set_value("threshold", json!("eight")),
            Err(SchemaError::TypeMismatch { .. })
        ));
        assert!(manager.set_value("threshold", json!(7.5)).is_err());

        manager.set_value("mode", json!("fast")).unwrap();
        assert!(manager.set_value("mode", json!("slow")).is_err());
        manager.set_value("nested###flag", json!(false)).unwrap();
        assert_eq!(manager.get_arguments()["nested"], json!({"flag": false}));

        assert!(matches!(
            manager.set_value("missing", json!(1)),
            Err(SchemaError::UnknownPath { .. })
        ));
        assert!(matches!(
            manager.set_value("", json!({})),
            Err(SchemaError::InvalidOperation { .. })
        ));
        assert!(manager.has_unsaved_changes());
    }

    #[test]
    fn test_array_editing() {
        let mut manager = manager();
        assert_eq!(manager.add_array_item("channels").unwrap(), 0);
        manager.set_value("channels###0", json!("DAPI")).unwrap();
        assert_eq!(manager.add_array_item("channels").unwrap(), 1);
        manager.set_value("channels###1", json!("GFP")).unwrap();
        assert!(manager.add_array_item("channels").is_err());

        manager.move_array_item_down("channels", 0).unwrap();
        assert_eq!(manager.get_value("channels"), Some(&json!(["GFP", "DAPI"])));
        manager.move_array_item_up("channels", 1).unwrap();
        assert_eq!(manager.get_value("channels"), Some(&json!(["DAPI", "GFP"])));
        manager.move_array_item_up("channels", 0).unwrap();
        manager.move_array_item_down("channels", 1).unwrap();
        assert_eq!(manager.get_value("channels"), Some(&json!(["DAPI", "GFP"])));

        manager.clear_array_item("channels", 1).unwrap();
        assert_eq!(manager.get_value("channels"), Some(&json!(["DAPI", null])));
        assert_eq!(manager.remove_array_item("channels", 0).unwrap(), json!("DAPI"));
        assert!(manager.remove_array_item("channels", 5).is_err());
        assert_eq!(manager.get_value("channels"), Some(&json!([null])));

        assert!(matches!(
            manager.move_array_item_down("channels", usize::MAX),
            Err(SchemaError::InvalidOperation { .. })
        ));
        assert!(manager.move_array_item_down("channels", 1).is_err());
        manager.move_array_item_down("channels", 0).unwrap();
    }

    #[test]
    fn test_tuple_editing() {
        let mut manager = manager();
        manager.remove_tuple("window").unwrap();
        assert_eq!(manager.get_value("window"), Some(&json!([])));
        manager.add_tuple("window").unwrap();
        assert_eq!(manager.get_value("window"), Some(&json!([3, 4])));
        assert!(manager.add_array_item("window").is_err());
        assert!(manager.remove_tuple("channels").is_err());
    }

    #[test]
    fn test_additional_properties() {
        let mut manager = manager();
        manager.add_property("extra", "gain", Some(json!("2.5"))).unwrap();
        assert_eq!(manager.get_value("extra###gain"), Some(&json!(2.5)));
        let field = manager.field("extra###gain").unwrap();
        assert_eq!(field.title, "gain");
        assert!(field.removable);

        let reason = |err: SchemaError| match err {
            SchemaError::InvalidOperation { reason, .. } => reason,
            other => panic!("unexpected error {other:?}"),
        };
        assert_eq!(
            reason(manager.add_property("extra", "", None).unwrap_err()),
            "Schema property has no name"
        );
        assert_eq!(
            reason(manager.add_property("extra", "gain", None).unwrap_err()),
            "Schema property already has a property with the same name"
        );
        assert!(manager.add_property("nested", "other", None).is_err());

        assert_eq!(manager.remove_property("extra", "gain").unwrap(), json!(2.5));
        assert_eq!(manager.get_value("extra"), Some(&json!({})));
        assert!(manager.remove_property("extra", "gain").is_err());
    }

    #[test]
    fn test_validate() {
        let mut manager = manager();
        let err = manager.validate().unwrap_err();
        let SchemaError::InvalidData { errors } = err else {
            panic!("expected invalid data");
        };
        assert_eq!(errors.len(), 1);

        manager.set_value("threshold", json!(7)).unwrap();
        manager.validate().unwrap();

        manager.set_value("threshold", json!(12)).unwrap();
        assert!(manager.validate().is_err());
    }

    #[test]
    fn test_change_listener() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut manager = manager();
        let sink = seen.clone();
        manager.set_change_listener(move |dirty| sink.borrow_mut().push(dirty));

        manager.set_value("label", json!("x")).unwrap();
        assert!(manager.has_unsaved_changes());
        manager.mark_saved();
        assert!(!manager.has_unsaved_changes());
        if let Some(level) = manager.get_value_mut("level") {
            *level = json!(2);
        }
        assert_eq!(manager.get_value("level"), Some(&json!(2)));
        assert_eq!(*seen.borrow(), [true, false, true]);
    }

    #[test]
    fn test_ignored_properties_and_preflight() {
        let schema = json!({
            "type": "object",
            "properties": {
                "zarr_url": {"type": "string"},
                "level": {"type": "integer"}
            },
            "required": ["zarr_url"]
        });
        let manager =
            SchemaManager::with_options(Some(schema), Some(json!({})), &FormOptions::v2()).unwrap();
        assert_eq!(manager.get_arguments(), json!({"level": null}));
        assert_eq!(manager.normalized_schema()["required"], json!([]));

        let bad = json!({"type": "object", "properties": {"a": {"type": "nope"}}});
        assert!(matches!(
            SchemaManager::with_options(Some(bad), Some(json!({})), &FormOptions::v2()),
            Err(SchemaError::InvalidSchema(_))
        ));
    }
}
