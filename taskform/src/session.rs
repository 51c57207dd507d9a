//! Schema, data and option files.
//!
//! Documents are read as JSON or TOML depending on the file extension.
//! Writing over an existing file first copies it to a timestamped backup
//! next to it.

use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use anyhow::{Context, bail};
use jschema::{FormOptions, KEY_SEPARATOR, Value};

/// Document formats understood by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
}

impl Format {
    /// Format selected by the extension of `path`.
    pub fn of(path: &Path) -> anyhow::Result<Self> {
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        match ext {
            "json" => Ok(Format::Json),
            "toml" | "tml" => Ok(Format::Toml),
            _ => bail!("Unsupported file extension: {ext:?}"),
        }
    }

    pub fn parse(self, content: &str) -> anyhow::Result<Value> {
        Ok(match self {
            Format::Json => serde_json::from_str(content)?,
            Format::Toml => {
                let v: toml::Value = toml::from_str(content)?;
                serde_json::to_value(v)?
            }
        })
    }

    pub fn render(self, value: &Value) -> anyhow::Result<String> {
        Ok(match self {
            Format::Json => serde_json::to_string_pretty(value)?,
            Format::Toml => toml::to_string_pretty(&without_nulls(value, "")?)?,
        })
    }
}

/// TOML has no `null`: unset object entries are left out. A `null` array
/// element cannot be dropped without shifting positions and is an error.
fn without_nulls(value: &Value, path: &str) -> anyhow::Result<Value> {
    let child = |key: &str| {
        if path.is_empty() {
            key.to_string()
        } else {
            format!("{path}{KEY_SEPARATOR}{key}")
        }
    };
    Ok(match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, v) in map {
                if !v.is_null() {
                    out.insert(key.clone(), without_nulls(v, &child(key))?);
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, v) in items.iter().enumerate() {
                let item_path = child(&index.to_string());
                if v.is_null() {
                    bail!("TOML cannot represent null at {item_path}");
                }
                out.push(without_nulls(v, &item_path)?);
            }
            Value::Array(out)
        }
        other => other.clone(),
    })
}

/// Read a JSON or TOML document.
pub fn read_document(path: &Path) -> anyhow::Result<Value> {
    if !path.exists() {
        bail!("File does not exist: {}", path.display());
    }
    let format = Format::of(path)?;
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    format
        .parse(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Read a data file. A missing or blank file yields an empty object.
pub fn read_data(path: &Path) -> anyhow::Result<Value> {
    if !path.exists() {
        debug!("Data file {} not found, starting empty", path.display());
        return Ok(Value::Object(Default::default()));
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    Format::of(path)?
        .parse(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write `value` to `path`, backing up an existing file first.
///
/// Returns the backup path when one was made.
pub fn write_document(path: &Path, value: &Value) -> anyhow::Result<Option<PathBuf>> {
    let format = Format::of(path)?;
    let content = format.render(value)?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");

    let mut backup = None;
    if path.exists() {
        let bk = format!(
            "bk-{:?}.{ext}",
            SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)?
                .as_secs()
        );
        let backup_path = path.with_extension(bk);
        fs::copy(path, &backup_path)
            .with_context(|| format!("Failed to back up {}", path.display()))?;
        info!("Backed up {} to {}", path.display(), backup_path.display());
        backup = Some(backup_path);
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(backup)
}

/// Load [`FormOptions`] from a TOML file, or the defaults.
pub fn load_options(path: Option<&Path>) -> anyhow::Result<FormOptions> {
    let Some(path) = path else {
        return Ok(FormOptions::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid options file {}", path.display()))
}

/// Split a `PATH=VALUE` assignment. The value is parsed as JSON, falling back
/// to a plain string.
pub fn parse_assignment(assignment: &str) -> anyhow::Result<(String, Value)> {
    let Some((path, raw)) = assignment.split_once('=') else {
        bail!("Expected PATH=VALUE, got {assignment:?}");
    };
    if path.is_empty() {
        bail!("Empty path in assignment {assignment:?}");
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((path.to_string(), value))
}
