//! Layered key/value store holding the resolved configuration.

use super::env::EnvBinder;
use super::file;
use super::keys::KNOWN_KEYS;
use super::value::{ConfigValue, ValueKind};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration layer, lowest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    /// Compiled-in defaults
    Default = 0,
    /// The JSON config file
    File = 1,
    /// `MINIKUBE_*` environment variables
    Environment = 2,
    /// Values supplied explicitly on the command line
    Explicit = 3,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Default => write!(f, "default"),
            Layer::File => write!(f, "config file"),
            Layer::Environment => write!(f, "environment"),
            Layer::Explicit => write!(f, "command line"),
        }
    }
}

/// The process-wide configuration, built once during bootstrap.
///
/// Lookups consult the layers from highest to lowest priority:
/// explicit, environment, config file, default. Keys are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    defaults: BTreeMap<String, ConfigValue>,
    file: BTreeMap<String, ConfigValue>,
    env: EnvBinder,
    explicit: BTreeMap<String, ConfigValue>,
    config_path: Option<PathBuf>,
}

fn normalize(key: &str) -> String {
    key.to_lowercase()
}

impl ConfigStore {
    pub fn new(env: EnvBinder) -> Self {
        Self {
            env,
            ..Self::default()
        }
    }

    /// Seed defaults for every known config-file property.
    pub fn with_known_defaults(mut self) -> Self {
        for key in KNOWN_KEYS {
            self.set_default(key.name, key.default_value());
        }
        self
    }

    /// Read the config file into the file layer.
    ///
    /// Only the first call has any effect. Failures leave the layer empty.
    pub fn load_file(&mut self, path: &Path) {
        if let Some(existing) = &self.config_path {
            debug!(path = %existing.display(), "Config file already loaded");
            return;
        }
        self.file = file::load(path)
            .into_iter()
            .map(|(k, v)| (normalize(&k), v))
            .collect();
        self.config_path = Some(path.to_path_buf());
        debug!(path = %path.display(), entries = self.file.len(), "Loaded config file");
    }

    /// The config file that was ingested, if any.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn env(&self) -> &EnvBinder {
        &self.env
    }

    pub fn set_default(&mut self, key: &str, value: impl Into<ConfigValue>) {
        self.defaults.insert(normalize(key), value.into());
    }

    /// Set a value in the explicit layer, overriding every other source.
    pub fn set(&mut self, key: &str, value: impl Into<ConfigValue>) {
        self.explicit.insert(normalize(key), value.into());
    }

    /// Every layer's value for `key`, highest priority first.
    fn candidates(&self, key: &str) -> Vec<(Layer, ConfigValue)> {
        let norm = normalize(key);
        let mut out = Vec::with_capacity(4);
        if let Some(v) = self.explicit.get(&norm) {
            out.push((Layer::Explicit, v.clone()));
        }
        if let Some(raw) = self.env.lookup(key) {
            out.push((Layer::Environment, ConfigValue::from(raw)));
        }
        if let Some(v) = self.file.get(&norm) {
            out.push((Layer::File, v.clone()));
        }
        if let Some(v) = self.defaults.get(&norm) {
            out.push((Layer::Default, v.clone()));
        }
        out
    }

    /// The winning value for `key` and the layer it came from.
    pub fn lookup(&self, key: &str) -> Option<(Layer, ConfigValue)> {
        self.candidates(key).into_iter().next()
    }

    pub fn get(&self, key: &str) -> Option<ConfigValue> {
        self.lookup(key).map(|(_, v)| v)
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// First value that converts with `cast`. A value that does not convert is
    /// skipped so a lower layer can still supply a usable one.
    fn resolve_with<T>(&self, key: &str, cast: impl Fn(&ConfigValue) -> Option<T>) -> Option<T> {
        for (layer, value) in self.candidates(key) {
            match cast(&value) {
                Some(v) => return Some(v),
                None => warn!(key = %key, layer = %layer, value = %value, "Ignoring unusable config value"),
            }
        }
        None
    }

    /// Resolved value converted to `kind`, skipping layers that do not convert.
    pub fn get_as(&self, key: &str, kind: ValueKind) -> Option<ConfigValue> {
        self.resolve_with(key, |value| value.cast(kind))
    }

    /// Resolved bool, `false` when unset.
    pub fn get_bool(&self, key: &str) -> bool {
        self.resolve_with(key, ConfigValue::as_bool).unwrap_or(false)
    }

    /// Resolved integer, `0` when unset.
    pub fn get_int(&self, key: &str) -> i64 {
        self.resolve_with(key, ConfigValue::as_int).unwrap_or(0)
    }

    /// Resolved value rendered as a string, empty when unset.
    pub fn get_string(&self, key: &str) -> String {
        self.get(key).map(|v| v.to_string()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::keys::{REMINDER_WAIT_PERIOD_IN_HOURS, WANT_UPDATE_NOTIFICATION};
    use tempfile::TempDir;

    fn store_with_env(vars: &[(&str, &str)]) -> ConfigStore {
        ConfigStore::new(EnvBinder::from_vars("MINIKUBE", vars.iter().copied()))
    }

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn default_is_lowest() {
        let mut store = store_with_env(&[]);
        store.set_default("v", 0i64);
        assert_eq!(store.lookup("v"), Some((Layer::Default, ConfigValue::Int(0))));
    }

    #[test]
    fn file_beats_default() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, r#"{"v": 2}"#);
        let mut store = store_with_env(&[]);
        store.set_default("v", 0i64);
        store.load_file(&path);
        assert_eq!(store.get_int("v"), 2);
        assert_eq!(store.lookup("v").map(|(l, _)| l), Some(Layer::File));
    }

    #[test]
    fn env_beats_file() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, r#"{"v": 2}"#);
        let mut store = store_with_env(&[("MINIKUBE_V", "5")]);
        store.load_file(&path);
        assert_eq!(store.get_int("v"), 5);
        assert_eq!(store.lookup("v").map(|(l, _)| l), Some(Layer::Environment));
    }

    #[test]
    fn explicit_beats_everything() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, r#"{"v": 2}"#);
        let mut store = store_with_env(&[("MINIKUBE_V", "5")]);
        store.load_file(&path);
        store.set("v", "9");
        assert_eq!(store.get_int("v"), 9);
    }

    #[test]
    fn keys_are_case_insensitive() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, r#"{"wantupdatenotification": false}"#);
        let mut store = store_with_env(&[]).with_known_defaults();
        store.load_file(&path);
        assert!(!store.get_bool(WANT_UPDATE_NOTIFICATION));
    }

    #[test]
    fn known_defaults_apply() {
        let store = store_with_env(&[]).with_known_defaults();
        assert!(store.get_bool(WANT_UPDATE_NOTIFICATION));
        assert_eq!(store.get_int(REMINDER_WAIT_PERIOD_IN_HOURS), 24);
    }

    #[test]
    fn unusable_env_value_falls_through() {
        let mut store = store_with_env(&[("MINIKUBE_REMINDERWAITPERIODINHOURS", "soon")]);
        store.set_default(REMINDER_WAIT_PERIOD_IN_HOURS, 24i64);
        assert_eq!(store.get_int(REMINDER_WAIT_PERIOD_IN_HOURS), 24);
    }

    #[test]
    fn file_is_ingested_once() {
        let temp = TempDir::new().unwrap();
        let first = write_config(&temp, r#"{"v": 2}"#);
        let second = temp.path().join("other.json");
        std::fs::write(&second, r#"{"v": 7}"#).unwrap();

        let mut store = store_with_env(&[]);
        store.load_file(&first);
        store.load_file(&second);
        assert_eq!(store.get_int("v"), 2);
        assert_eq!(store.config_path(), Some(first.as_path()));
    }

    #[test]
    fn missing_key_reads_as_zero_values() {
        let store = store_with_env(&[]);
        assert!(!store.is_set("nothing"));
        assert!(!store.get_bool("nothing"));
        assert_eq!(store.get_int("nothing"), 0);
        assert_eq!(store.get_string("nothing"), "");
    }
}
