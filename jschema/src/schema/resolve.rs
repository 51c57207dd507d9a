use log::warn;
use serde_json::Value;

/// Resolve a local `$ref` pointer (`#/definitions/Foo`, `#/$defs/Foo`, `#`)
/// against the document root.
///
/// Returns `None` when the reference is not local, is not a pointer, or
/// names a path that does not exist. Callers treat `None` as "could not be
/// resolved".
pub fn resolve_ref<'a>(reference: &str, root: &'a Value) -> Option<&'a Value> {
    let Some(pointer) = reference.strip_prefix('#') else {
        warn!("Unsupported $ref field format: {reference}");
        return None;
    };

    if !pointer.is_empty() && !pointer.starts_with('/') {
        warn!("Unsupported $ref anchor: {reference}");
        return None;
    }

    let mut node = root;
    // The first segment is the empty root marker before the leading '/'.
    for segment in pointer.split('/').skip(1) {
        let segment = unescape(segment);
        node = match node {
            Value::Object(map) => map.get(segment.as_str())?,
            Value::Array(arr) => arr.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}

fn unescape(segment: &str) -> String {
    if segment.contains('~') {
        segment.replace("~1", "/").replace("~0", "~")
    } else {
        segment.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "type": "object",
            "properties": {"a": {"$ref": "#/definitions/A"}},
            "definitions": {
                "A": {"type": "string", "title": "A"},
                "a/b": {"type": "integer"}
            },
            "$defs": {"B": {"type": "boolean"}},
            "prefixItems": [{"type": "null"}]
        })
    }

    #[test]
    fn test_resolve_definitions_and_defs() {
        let doc = document();
        assert_eq!(
            resolve_ref("#/definitions/A", &doc),
            Some(&json!({"type": "string", "title": "A"}))
        );
        assert_eq!(
            resolve_ref("#/$defs/B", &doc),
            Some(&json!({"type": "boolean"}))
        );
    }

    #[test]
    fn test_resolve_root_and_escapes() {
        let doc = document();
        assert_eq!(resolve_ref("#", &doc), Some(&doc));
        assert_eq!(
            resolve_ref("#/definitions/a~1b", &doc),
            Some(&json!({"type": "integer"}))
        );
        assert_eq!(
            resolve_ref("#/prefixItems/0", &doc),
            Some(&json!({"type": "null"}))
        );
    }

    #[test]
    fn test_unresolvable_references() {
        let doc = document();
        assert_eq!(resolve_ref("#/definitions/Missing", &doc), None);
        assert_eq!(resolve_ref("#/definitions/A/type/x", &doc), None);
        assert_eq!(resolve_ref("other.json#/definitions/A", &doc), None);
        assert_eq!(resolve_ref("#anchor", &doc), None);
    }
}
