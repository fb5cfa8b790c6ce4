//! Reconcile command-line flags with the layered config store.
//!
//! Two kinds of flag take part:
//!
//! - **Bound** flags (the root command's own persistent flags) are mirrored into
//!   the store so code reading the store sees them. Their flag state is left
//!   alone.
//! - **Whitelisted** flags (owned by collaborators like the logging layer, which
//!   only ever read their own flag state) are resolved through the store and the
//!   result is written back into the flag.
//!
//! Either way, a value given on the command line wins over the environment,
//! which wins over the config file, which wins over the flag's default.

use super::store::ConfigStore;
use crate::error::{BootstrapError, Result};
use crate::flags::FlagSet;
use tracing::{debug, warn};

/// Flags that may be overridden from the environment or the config file.
pub const FLAG_WHITELIST: &[&str] = &["v", "alsologtostderr", "log_dir"];

/// Check that every whitelisted name has a registered flag.
pub fn check_whitelist(flags: &FlagSet, whitelist: &[&str]) -> Result<()> {
    match whitelist.iter().find(|name| flags.lookup(name).is_none()) {
        Some(name) => Err(BootstrapError::UnregisteredFlag(name.to_string())),
        None => Ok(()),
    }
}

/// Mirror flags into the store: the default seeds the default layer and an
/// explicit value lands in the explicit layer.
pub fn bind_flags<'a>(
    store: &mut ConfigStore,
    flags: &FlagSet,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    for name in names {
        let flag = flags
            .lookup(name)
            .ok_or_else(|| BootstrapError::UnregisteredFlag(name.to_string()))?;
        store.set_default(name, flag.default_value().clone());
        if flag.changed() {
            store.set(name, flag.value().clone());
        }
    }
    Ok(())
}

/// Resolve every whitelisted flag through the store and write the result back.
///
/// Each flag takes the highest-priority value that reads as the flag's type;
/// layers holding something unusable are skipped, so the flag always agrees
/// with the store's typed getters. Afterwards each whitelisted flag is marked
/// changed, so code that only looks at flag state sees the resolved value. Fails without touching anything if a
/// whitelisted name is not registered.
pub fn resolve_whitelisted(
    store: &mut ConfigStore,
    flags: &mut FlagSet,
    whitelist: &[&str],
) -> Result<()> {
    check_whitelist(flags, whitelist)?;
    bind_flags(store, flags, whitelist.iter().copied())?;

    for name in whitelist {
        let Some(flag) = flags.lookup_mut(name) else {
            continue;
        };
        if flag.changed() {
            continue;
        }
        let kind = flag.def().kind();
        match store.get_as(name, kind) {
            Some(value) => {
                debug!(flag = %name, value = %value, "Resolved flag from config");
                flag.set_value(value);
            }
            None => {
                warn!(flag = %name, "No usable value for flag, keeping default");
                flag.mark_changed();
            }
        }
    }
    Ok(())
}
