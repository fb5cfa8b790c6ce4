//! The persisted JSON config file.

use super::value::ConfigValue;
use crate::error::{BootstrapError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Load the config file into a flat key/value map.
///
/// Never fails: a missing or malformed file is logged and treated as empty.
/// Keys are kept as written; entries that are not scalars are skipped.
pub fn load(path: &Path) -> BTreeMap<String, ConfigValue> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Error reading config file at {}: {}", path.display(), e);
            return BTreeMap::new();
        }
    };

    let object: Map<String, Value> = match serde_json::from_str(&content) {
        Ok(object) => object,
        Err(e) => {
            warn!("Error reading config file at {}: {}", path.display(), e);
            return BTreeMap::new();
        }
    };

    let mut values = BTreeMap::new();
    for (key, raw) in object {
        match serde_json::from_value::<ConfigValue>(raw) {
            Ok(value) => {
                values.insert(key, value);
            }
            Err(_) => warn!(key = %key, "Ignoring non-scalar config file entry"),
        }
    }
    values
}

/// Write `values` back to the config file as a pretty-printed JSON object.
pub fn save(path: &Path, values: &BTreeMap<String, ConfigValue>) -> Result<()> {
    let mut content = serde_json::to_string_pretty(values)?;
    content.push('\n');

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| BootstrapError::WriteConfig {
            path: path.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, content).map_err(|source| BootstrapError::WriteConfig {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(load(&temp.path().join("config.json")).is_empty());
    }

    #[test]
    fn invalid_json_is_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load(&path).is_empty());
    }

    #[test]
    fn top_level_array_is_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(load(&path).is_empty());
    }

    #[test]
    fn scalars_are_loaded_and_others_skipped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"WantUpdateNotification": false, "v": 2, "log_dir": "/l", "nested": {"a": 1}}"#,
        )
        .unwrap();

        let values = load(&path);
        assert_eq!(values.get("WantUpdateNotification"), Some(&ConfigValue::Bool(false)));
        assert_eq!(values.get("v"), Some(&ConfigValue::Int(2)));
        assert_eq!(values.get("log_dir"), Some(&ConfigValue::from("/l")));
        assert!(!values.contains_key("nested"));
    }

    #[test]
    fn save_then_load_preserves_entries() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config").join("config.json");
        let mut values = BTreeMap::new();
        values.insert("ReminderWaitPeriodInHours".to_string(), ConfigValue::Int(48));

        save(&path, &values).unwrap();

        assert_eq!(load(&path), values);
    }
}
