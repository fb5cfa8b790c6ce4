//! Selection of the machine driver client.

use crate::config::ConfigStore;
use std::fmt;

/// Flag that switches drivers to the in-process implementation.
pub const USE_VENDORED_DRIVER_FLAG: &str = "use-vendored-driver";

/// How the tool talks to machine drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientType {
    /// Drivers linked into the binary
    Local,
    /// Driver plugins over RPC (default)
    #[default]
    Rpc,
}

impl ClientType {
    pub fn from_config(store: &ConfigStore) -> Self {
        if store.get_bool(USE_VENDORED_DRIVER_FLAG) {
            ClientType::Local
        } else {
            ClientType::Rpc
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientType::Local => write!(f, "local"),
            ClientType::Rpc => write!(f, "rpc"),
        }
    }
}
