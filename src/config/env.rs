//! Environment variable binding.
//!
//! A configuration key `some-key` is read from `MINIKUBE_SOME_KEY`: the key is
//! upper-cased, every `-` becomes `_`, and the prefix plus `_` is prepended.
//! Any key the store is asked about is looked up this way, with no per-key
//! registration.

use crate::error::{BootstrapError, Result};
use std::collections::HashMap;
use tracing::debug;

/// Prefix shared by every minikube environment variable.
pub const ENV_PREFIX: &str = "MINIKUBE";

/// Derive the environment variable name for a configuration key.
pub fn env_var_name(prefix: &str, key: &str) -> String {
    format!("{}_{}", prefix, key.to_uppercase().replace('-', "_"))
}

/// Check that no two keys map to the same environment variable.
pub fn check_collisions<'a>(
    prefix: &str,
    keys: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for key in keys {
        let var = env_var_name(prefix, key);
        if let Some(first) = seen.get(&var) {
            if !first.eq_ignore_ascii_case(key) {
                return Err(BootstrapError::EnvKeyCollision {
                    first: first.to_string(),
                    second: key.to_string(),
                    var,
                });
            }
            continue;
        }
        seen.insert(var, key);
    }
    Ok(())
}

/// A snapshot of the prefixed environment variables.
///
/// Captured once so lookups are stable for the rest of the process and tests
/// can supply their own variables instead of mutating the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvBinder {
    prefix: String,
    vars: HashMap<String, String>,
}

impl EnvBinder {
    /// Capture variables from the process environment.
    pub fn from_process(prefix: &str) -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
        Self::from_vars(prefix, vars)
    }

    /// Capture variables from an explicit list. Only names starting with
    /// `<prefix>_` are kept.
    pub fn from_vars<I, K, V>(prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let wanted = format!("{prefix}_");
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| k.starts_with(&wanted))
            .collect();
        for (name, value) in &vars {
            debug!(name = %name, value = %value, "Environment configuration");
        }
        Self {
            prefix: prefix.to_string(),
            vars,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The environment variable name that binds `key`.
    pub fn var_name(&self, key: &str) -> String {
        env_var_name(&self.prefix, key)
    }

    /// The raw value bound to `key`, if its variable is set.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.vars.get(&self.var_name(key)).map(String::as_str)
    }
}
