//! Configuration keys recognized in the config file and their defaults.

use super::value::{ConfigValue, ValueKind};

pub const WANT_UPDATE_NOTIFICATION: &str = "WantUpdateNotification";
pub const REMINDER_WAIT_PERIOD_IN_HOURS: &str = "ReminderWaitPeriodInHours";
pub const WANT_REPORT_ERROR: &str = "WantReportError";
pub const WANT_REPORT_ERROR_PROMPT: &str = "WantReportErrorPrompt";
pub const WANT_KUBECTL_DOWNLOAD_MSG: &str = "WantKubectlDownloadMsg";

/// A known configuration property.
#[derive(Debug, Clone, Copy)]
pub struct KnownKey {
    pub name: &'static str,
    pub kind: ValueKind,
    pub default: fn() -> ConfigValue,
}

impl KnownKey {
    pub fn default_value(&self) -> ConfigValue {
        (self.default)()
    }
}

/// Every config-file property with its compiled-in default.
pub const KNOWN_KEYS: &[KnownKey] = &[
    KnownKey {
        name: WANT_UPDATE_NOTIFICATION,
        kind: ValueKind::Bool,
        default: || ConfigValue::Bool(true),
    },
    KnownKey {
        name: REMINDER_WAIT_PERIOD_IN_HOURS,
        kind: ValueKind::Int,
        default: || ConfigValue::Int(24),
    },
    KnownKey {
        name: WANT_REPORT_ERROR,
        kind: ValueKind::Bool,
        default: || ConfigValue::Bool(false),
    },
    KnownKey {
        name: WANT_REPORT_ERROR_PROMPT,
        kind: ValueKind::Bool,
        default: || ConfigValue::Bool(true),
    },
    KnownKey {
        name: WANT_KUBECTL_DOWNLOAD_MSG,
        kind: ValueKind::Bool,
        default: || ConfigValue::Bool(true),
    },
];

/// Find a known key, ignoring case.
pub fn find(name: &str) -> Option<&'static KnownKey> {
    KNOWN_KEYS.iter().find(|k| k.name.eq_ignore_ascii_case(name))
}
