//! Terminal rendering of form fields.

use colored::Colorize;
use jschema::{FieldKind, FormField, Value};

/// Render `fields` as an indented tree, one line per field.
pub fn field_tree(fields: &[FormField]) -> String {
    let mut out = String::new();
    for field in fields {
        write_field(&mut out, field, 0);
    }
    out
}

fn write_field(out: &mut String, field: &FormField, depth: usize) {
    let indent = "  ".repeat(depth);
    let title = match (&field.key, field.title.is_empty()) {
        (_, false) => field.title.clone(),
        (Some(key), true) => key.clone(),
        (None, true) => format!("[{}]", field.path.key().unwrap_or_default()),
    };
    let marker = if field.required { "*".red().bold().to_string() } else { String::new() };

    out.push_str(&format!(
        "{indent}{}{marker} {}",
        title.bold(),
        kind_label(&field.kind).cyan()
    ));
    if !matches!(
        field.kind,
        FieldKind::Object { .. } | FieldKind::Array { .. } | FieldKind::Tuple { .. }
    ) {
        out.push_str(&format!(" = {}", value_label(&field.value)));
    }
    if let Some(options) = field.enum_options() {
        let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
        out.push_str(&format!(" {}", format!("[{}]", labels.join(" | ")).dimmed()));
    }
    if field.removable {
        out.push_str(&format!(" {}", "(removable)".dimmed()));
    }
    out.push('\n');
    if !field.description.is_empty() {
        out.push_str(&format!("{indent}  {}\n", field.description.italic().dimmed()));
    }
    for child in field.children() {
        write_field(out, child, depth + 1);
    }
}

/// Short type description including bounds and sizes.
pub fn kind_label(kind: &FieldKind) -> String {
    match kind {
        FieldKind::String => "string".to_string(),
        FieldKind::Number {
            integer,
            minimum,
            maximum,
        } => {
            let name = if *integer { "integer" } else { "number" };
            match (minimum, maximum) {
                (None, None) => name.to_string(),
                (min, max) => format!(
                    "{name} {}..{}",
                    min.map(|v| v.to_string()).unwrap_or_default(),
                    max.map(|v| v.to_string()).unwrap_or_default()
                ),
            }
        }
        FieldKind::Boolean => "boolean".to_string(),
        FieldKind::Enum(_) => "enum".to_string(),
        FieldKind::Object {
            allows_additional, ..
        } => {
            if *allows_additional {
                "object {..}".to_string()
            } else {
                "object".to_string()
            }
        }
        FieldKind::Array {
            children,
            max_items,
            ..
        } => match max_items {
            Some(max) => format!("array {}/{max}", children.len()),
            None => format!("array {}", children.len()),
        },
        FieldKind::Tuple { size, .. } => format!("tuple({size})"),
        FieldKind::Null => "null".to_string(),
        FieldKind::Any => "any".to_string(),
    }
}

fn value_label(value: &Value) -> String {
    match value {
        Value::Null => "-".dimmed().to_string(),
        Value::String(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jschema::SchemaManager;
    use serde_json::json;

    #[test]
    fn test_kind_labels() {
        assert_eq!(
            kind_label(&FieldKind::Number {
                integer: true,
                minimum: Some(6.0),
                maximum: Some(9.0)
            }),
            "integer 6..9"
        );
        assert_eq!(
            kind_label(&FieldKind::Number {
                integer: false,
                minimum: None,
                maximum: None
            }),
            "number"
        );
        assert_eq!(
            kind_label(&FieldKind::Tuple {
                children: vec![],
                size: 3
            }),
            "tuple(3)"
        );
    }

    #[test]
    fn test_field_tree_lists_every_field() {
        colored::control::set_override(false);
        let manager = SchemaManager::new(
            Some(json!({
                "type": "object",
                "properties": {
                    "level": {"type": "integer", "title": "Level", "default": 1},
                    "mode": {"enum": ["a", "b"]},
                    "inner": {"type": "object", "properties": {"flag": {"type": "boolean"}}}
                },
                "required": ["level"]
            })),
            Some(json!({})),
        )
        .unwrap();
        let tree = field_tree(&manager.fields());
        let lines: Vec<_> = tree.lines().collect();
        assert_eq!(
            lines,
            [
                "Level* integer = 1",
                "mode enum = - [Select... | a | b]",
                "inner object",
                "  flag boolean = -",
            ]
        );
    }

    #[test]
    fn test_field_tree_descriptions_and_extra_keys() {
        colored::control::set_override(false);
        let manager = SchemaManager::new(
            Some(json!({
                "type": "object",
                "properties": {
                    "extra": {
                        "type": "object",
                        "description": "Free-form metadata",
                        "additionalProperties": {"type": "string"}
                    }
                }
            })),
            Some(json!({"extra": {"site": "A"}})),
        )
        .unwrap();
        let tree = field_tree(&manager.fields());
        assert_eq!(
            tree,
            "extra object {..}\n  Free-form metadata\n  site string = \"A\" (removable)\n"
        );
    }
}
