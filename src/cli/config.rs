//! `minikube config` subcommand.
//!
//! `get` reports the resolved value of a property, so environment overrides
//! and defaults show up. `set`, `unset` and `view` work on the config file.

use crate::bootstrap::RuntimeConfig;
use crate::config::keys;
use crate::config::{ConfigValue, ValueKind, file};
use crate::error::{BootstrapError, Result};
use clap::Subcommand;
use std::io::Write;
use tracing::info;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Gets the value of PROPERTY_NAME from the minikube config
    Get {
        #[arg(value_name = "PROPERTY_NAME")]
        key: String,
    },

    /// Sets an individual value in the minikube config file
    Set {
        #[arg(value_name = "PROPERTY_NAME")]
        key: String,
        #[arg(value_name = "PROPERTY_VALUE")]
        value: String,
    },

    /// Unsets an individual value in the minikube config file
    Unset {
        #[arg(value_name = "PROPERTY_NAME")]
        key: String,
    },

    /// Display values currently set in the minikube config file
    View,
}

impl ConfigCommand {
    pub fn shows_notices(&self) -> bool {
        !matches!(self, ConfigCommand::Get { .. } | ConfigCommand::View)
    }
}

/// Canonical name and type of a settable property: a known config key or a
/// flag that can be overridden from the config file.
fn property(config: &RuntimeConfig, key: &str) -> Result<(String, ValueKind)> {
    if let Some(known) = keys::find(key) {
        return Ok((known.name.to_string(), known.kind));
    }
    config
        .flags
        .lookup(key)
        .map(|flag| (flag.name().to_string(), flag.def().kind()))
        .ok_or_else(|| BootstrapError::UnknownKey(key.to_string()))
}

pub fn run(cmd: &ConfigCommand, config: &RuntimeConfig, out: &mut impl Write) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Get { key } => {
            let (name, _) = property(config, key)?;
            match config.store.get(&name) {
                Some(value) => writeln!(out, "{value}")?,
                None => anyhow::bail!("specified key could not be found in config"),
            }
        }
        ConfigCommand::Set { key, value } => set(config, key, value)?,
        ConfigCommand::Unset { key } => unset(config, key)?,
        ConfigCommand::View => {
            for (key, value) in file::load(&config.paths.config_file()) {
                writeln!(out, "- {key}: {value}")?;
            }
        }
    }
    Ok(())
}

/// Validate and write a property to the config file.
pub fn set(config: &RuntimeConfig, key: &str, raw: &str) -> Result<()> {
    let (name, kind) = property(config, key)?;
    let value: ConfigValue = kind.parse(raw).ok_or_else(|| BootstrapError::InvalidValue {
        key: name.clone(),
        value: raw.to_string(),
        expected: kind.name(),
    })?;

    let path = config.paths.config_file();
    let mut values = file::load(&path);
    values.retain(|k, _| !k.eq_ignore_ascii_case(&name));
    values.insert(name.clone(), value);
    file::save(&path, &values)?;
    info!(key = %name, value = %raw, "Config value set");
    Ok(())
}

/// Remove a property from the config file. Removing an absent key is not an error.
pub fn unset(config: &RuntimeConfig, key: &str) -> Result<()> {
    let path = config.paths.config_file();
    let mut values = file::load(&path);
    let before = values.len();
    values.retain(|k, _| !k.eq_ignore_ascii_case(key));
    if values.len() != before {
        file::save(&path, &values)?;
        info!(key = %key, "Config value unset");
    }
    Ok(())
}
