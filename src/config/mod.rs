//! Layered configuration.
//!
//! Values come from four layers, highest priority first:
//! 1. **Command line** - flags given explicitly on this invocation
//! 2. **Environment** - `MINIKUBE_<KEY>` with `-` mapped to `_`
//! 3. **Config file** - `~/.minikube/config/config.json`
//! 4. **Defaults** - compiled in, or taken from a flag's default
//!
//! The store is built once during bootstrap and is read-only afterwards.

pub mod env;
pub mod file;
pub mod keys;
pub mod resolve;
mod store;
mod value;

pub use env::{ENV_PREFIX, EnvBinder, check_collisions, env_var_name};
pub use resolve::{FLAG_WHITELIST, bind_flags, check_whitelist, resolve_whitelisted};
pub use store::{ConfigStore, Layer};
pub use value::{ConfigValue, ValueKind, parse_bool};
