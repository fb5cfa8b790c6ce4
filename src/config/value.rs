//! Typed configuration values and lenient casting between them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar configuration value.
///
/// Serialized untagged, so it reads and writes plain JSON booleans, integers
/// and strings. Other JSON values (arrays, objects, null, fractional numbers)
/// fail to deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    String(String),
}

/// The type a configuration key or flag expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
    String,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::String => "string",
        }
    }

    /// Parse `raw` strictly into this kind.
    pub fn parse(self, raw: &str) -> Option<ConfigValue> {
        match self {
            ValueKind::Bool => parse_bool(raw).map(ConfigValue::Bool),
            ValueKind::Int => raw.trim().parse().ok().map(ConfigValue::Int),
            ValueKind::String => Some(ConfigValue::String(raw.to_string())),
        }
    }
}

impl ConfigValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ConfigValue::Bool(_) => ValueKind::Bool,
            ConfigValue::Int(_) => ValueKind::Int,
            ConfigValue::String(_) => ValueKind::String,
        }
    }

    /// Convert to `kind`, or `None` when this value has no reading as that kind.
    pub fn cast(&self, kind: ValueKind) -> Option<ConfigValue> {
        match kind {
            ValueKind::Bool => self.as_bool().map(ConfigValue::Bool),
            ValueKind::Int => self.as_int().map(ConfigValue::Int),
            ValueKind::String => Some(ConfigValue::String(self.to_string())),
        }
    }

    /// Read as a bool. Strings are parsed, integers are true when non-zero.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            ConfigValue::Int(i) => Some(*i != 0),
            ConfigValue::String(s) => parse_bool(s),
        }
    }

    /// Read as an integer. Bools become 1 or 0.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Bool(b) => Some(i64::from(*b)),
            ConfigValue::Int(i) => Some(*i),
            ConfigValue::String(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Int(i) => write!(f, "{i}"),
            ConfigValue::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

/// Parse the boolean spellings accepted on the command line and in the
/// environment.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
