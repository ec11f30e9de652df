//! Read-only access to board file contents.
//!
//! The board format belongs to the board library; this module only locates a
//! file inside the working root and hands back its contents as JSON for the
//! client. `BoardStore` is the seam where a richer board library plugs in.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

use crate::discovery::{BOARD_FILE_SUFFIX, PathSandbox};
use crate::errors::BoardError;

/// Loads a board file that has already been located and validated.
pub trait BoardStore: Send + Sync {
    fn load(&self, path: &Path) -> Result<JsonValue, BoardError>;
}

/// Board files stored as YAML documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlBoardStore;

impl BoardStore for YamlBoardStore {
    fn load(&self, path: &Path) -> Result<JsonValue, BoardError> {
        let content = fs::read_to_string(path).map_err(|source| BoardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let doc: YamlValue = serde_yaml::from_str(&content).map_err(|source| BoardError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(yaml_to_json(doc))
    }
}

/// Locate a board file inside the sandbox.
///
/// Absolute paths (as returned in listings) are checked for containment;
/// anything else is resolved relative to the working root.
pub fn locate_board(sandbox: &PathSandbox, raw: &str) -> Result<PathBuf, BoardError> {
    if !raw.ends_with(BOARD_FILE_SUFFIX) {
        return Err(BoardError::InvalidPath {
            path: raw.to_string(),
            message: format!("board files must end with {BOARD_FILE_SUFFIX}"),
        });
    }

    let candidate = Path::new(raw);
    let resolved = if candidate.is_absolute() {
        sandbox.contain(candidate)?
    } else {
        sandbox.resolve(raw)?
    };

    if !resolved.is_file() {
        return Err(BoardError::NotFound { path: resolved });
    }
    Ok(resolved)
}

/// Convert a YAML document to JSON. Non-string mapping keys (e.g. numeric
/// task ids) become their string form.
pub fn yaml_to_json(value: YamlValue) -> JsonValue {
    match value {
        YamlValue::Null => JsonValue::Null,
        YamlValue::Bool(b) => JsonValue::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                JsonValue::from(i)
            } else if let Some(u) = n.as_u64() {
                JsonValue::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::Null)
            }
        }
        YamlValue::String(s) => JsonValue::String(s),
        YamlValue::Sequence(items) => JsonValue::Array(items.into_iter().map(yaml_to_json).collect()),
        YamlValue::Mapping(map) => JsonValue::Object(
            map.into_iter()
                .map(|(k, v)| (mapping_key(k), yaml_to_json(v)))
                .collect(),
        ),
        YamlValue::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn mapping_key(key: YamlValue) -> String {
    match key {
        YamlValue::String(s) => s,
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
