use jschema::{FieldKind, FormOptions, SchemaManager, normalize};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
enum Mode {
    Fast,
    Accurate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
struct Window {
    x: i64,
    y: i64,
}

/// Segmentation task arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
struct TaskArgs {
    /// Intensity threshold.
    threshold: u32,
    label: String,
    mode: Mode,
    channels: Vec<String>,
    window: Window,
    level: Option<i64>,
}

fn sample() -> TaskArgs {
    TaskArgs {
        threshold: 12,
        label: "nuclei".to_string(),
        mode: Mode::Accurate,
        channels: vec!["DAPI".to_string(), "GFP".to_string()],
        window: Window { x: 3, y: 4 },
        level: Some(2),
    }
}

fn derived_schema() -> Value {
    serde_json::to_value(schema_for!(TaskArgs)).unwrap()
}

#[test]
fn test_derived_schema_is_ref_free_after_normalize() {
    init_logging();
    let schema = derived_schema();
    let normalized = normalize(&schema).unwrap();
    let properties = &normalized["properties"];

    assert_eq!(properties["mode"]["enum"], json!(["fast", "accurate"]));
    assert_eq!(properties["window"]["properties"]["x"]["type"], "integer");
    assert!(properties["window"].get("$ref").is_none());
    assert_eq!(normalize(&normalized).unwrap(), normalized);
}

#[test]
fn test_round_trip_reproduces_conforming_data() {
    init_logging();
    let data = serde_json::to_value(sample()).unwrap();
    let manager = SchemaManager::new(Some(derived_schema()), Some(data.clone())).unwrap();

    let arguments = manager.get_arguments();
    assert_eq!(arguments, data);
    manager.validate().unwrap();

    let back: TaskArgs = serde_json::from_value(arguments).unwrap();
    assert_eq!(back, sample());
}

#[test]
fn test_edits_through_field_paths() {
    init_logging();
    let data = serde_json::to_value(sample()).unwrap();
    let mut manager = SchemaManager::new(Some(derived_schema()), Some(data)).unwrap();

    let threshold = manager.field("threshold").unwrap();
    assert_eq!(threshold.description, "Intensity threshold.");
    assert!(matches!(threshold.kind, FieldKind::Number { integer: true, .. }));

    manager.set_value("window###y", json!("9")).unwrap();
    manager.set_value("mode", json!("fast")).unwrap();
    manager.remove_array_item("channels", 0).unwrap();
    manager.set_value("level", json!("")).unwrap();

    let back: TaskArgs = serde_json::from_value(manager.get_arguments()).unwrap();
    assert_eq!(back.window, Window { x: 3, y: 9 });
    assert_eq!(back.mode, Mode::Fast);
    assert_eq!(back.channels, ["GFP"]);
    assert_eq!(back.level, None);
    assert!(manager.has_unsaved_changes());
}

#[test]
fn test_options_schema_builds_a_form() {
    init_logging();
    let schema = serde_json::to_value(schema_for!(FormOptions)).unwrap();
    let options = serde_json::to_value(FormOptions::legacy()).unwrap();
    let manager = SchemaManager::new(Some(schema), Some(options.clone())).unwrap();

    assert_eq!(manager.get_arguments(), options);
    let draft = manager.field("draft").unwrap();
    assert!(matches!(draft.kind, FieldKind::Enum(_)));
    let parsed: FormOptions = serde_json::from_value(manager.get_arguments()).unwrap();
    assert_eq!(parsed, FormOptions::legacy());
}
