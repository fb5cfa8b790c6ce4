//! Error types surfaced by the startup sequence and the `config` subcommand.
//!
//! Only a few conditions are errors at all. A missing or malformed config file,
//! a failed release lookup and deprecated flags are absorbed where they happen
//! and reported through logging or plain text instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for bootstrap operations.
pub type Result<T, E = BootstrapError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A required directory could not be created. Fatal.
    #[error("Error creating minikube directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A whitelisted name has no registered flag behind it.
    #[error("flag {0:?} is whitelisted for config override but is not registered")]
    UnregisteredFlag(String),

    /// Two recognized keys mangle to the same environment variable.
    #[error("config keys {first:?} and {second:?} both map to environment variable {var}")]
    EnvKeyCollision {
        first: String,
        second: String,
        var: String,
    },

    /// The home directory could not be determined and `MINIKUBE_HOME` is unset.
    #[error("unable to determine home directory; set MINIKUBE_HOME")]
    NoHomeDir,

    #[error("unknown config property {0:?}")]
    UnknownKey(String),

    #[error("invalid value {value:?} for {key}: expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("failed to write config file {path}: {source}")]
    WriteConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode config file: {0}")]
    EncodeConfig(#[from] serde_json::Error),
}
