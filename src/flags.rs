//! Flag definitions and the parsed flag state of one invocation.
//!
//! Flags come from two places: the root command's own persistent flags and
//! flag sets imported from collaborators such as the logging layer. Both are
//! described by [`FlagDef`], attached to the clap command the same way, and
//! read back into a single [`FlagSet`] so the config resolver can treat them
//! uniformly.

use crate::config::{ConfigValue, ValueKind};
use crate::error::{BootstrapError, Result};
use clap::parser::ValueSource;
use clap::{Arg, ArgMatches};

/// Static description of a flag: name, type, default and help text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagDef {
    pub name: String,
    pub default: ConfigValue,
    pub usage: String,
}

impl FlagDef {
    pub fn new(
        name: impl Into<String>,
        default: impl Into<ConfigValue>,
        usage: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
            usage: usage.into(),
        }
    }

    pub fn kind(&self) -> ValueKind {
        self.default.kind()
    }

    /// Build the global clap argument for this flag.
    ///
    /// Values are validated against the flag's kind but kept as strings, so
    /// every flag is read back the same way. Bool flags accept a bare
    /// `--name` as `true` or an explicit `--name=false`.
    pub fn to_arg(&self) -> Arg {
        let kind = self.kind();
        let arg = Arg::new(self.name.clone())
            .long(self.name.clone())
            .help(self.usage.clone())
            .global(true)
            .value_parser(move |raw: &str| -> std::result::Result<String, String> {
                kind.parse(raw)
                    .map(|_| raw.to_string())
                    .ok_or_else(|| format!("expected a {} value", kind.name()))
            });
        match kind {
            ValueKind::Bool => arg
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true"),
            ValueKind::Int | ValueKind::String => arg.num_args(1),
        }
    }
}

/// A registered flag and its state for this invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    def: FlagDef,
    value: ConfigValue,
    changed: bool,
}

impl Flag {
    fn new(def: FlagDef) -> Self {
        let value = def.default.clone();
        Self {
            def,
            value,
            changed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn def(&self) -> &FlagDef {
        &self.def
    }

    pub fn default_value(&self) -> &ConfigValue {
        &self.def.default
    }

    pub fn value(&self) -> &ConfigValue {
        &self.value
    }

    /// Whether the value was set explicitly (or written back by the resolver).
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Parse `raw` into the flag's kind and mark the flag changed.
    pub fn set(&mut self, raw: &str) -> Result<()> {
        let kind = self.def.kind();
        self.value = kind.parse(raw).ok_or_else(|| BootstrapError::InvalidValue {
            key: self.def.name.clone(),
            value: raw.to_string(),
            expected: kind.name(),
        })?;
        self.changed = true;
        Ok(())
    }

    /// Store an already-typed value and mark the flag changed.
    pub(crate) fn set_value(&mut self, value: ConfigValue) {
        self.value = value;
        self.changed = true;
    }

    pub(crate) fn mark_changed(&mut self) {
        self.changed = true;
    }
}

/// All flags known to the command dispatcher, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    flags: Vec<Flag>,
}

impl FlagSet {
    pub fn new(defs: impl IntoIterator<Item = FlagDef>) -> Self {
        let mut set = Self::default();
        set.extend(defs);
        set
    }

    /// Register additional flags. A name that is already registered keeps its
    /// first definition.
    pub fn extend(&mut self, defs: impl IntoIterator<Item = FlagDef>) {
        for def in defs {
            if self.lookup(&def.name).is_none() {
                self.flags.push(Flag::new(def));
            }
        }
    }

    /// Read flag values from parsed arguments. Only values that came from the
    /// command line mark a flag changed.
    pub fn from_matches(defs: impl IntoIterator<Item = FlagDef>, matches: &ArgMatches) -> Result<Self> {
        let mut set = Self::new(defs);
        for flag in &mut set.flags {
            let from_cli = matches
                .try_get_one::<String>(flag.name())
                .ok()
                .flatten()
                .filter(|_| matches.value_source(flag.name()) == Some(ValueSource::CommandLine))
                .cloned();
            if let Some(raw) = from_cli {
                flag.set(&raw)?;
            }
        }
        Ok(set)
    }

    pub fn lookup(&self, name: &str) -> Option<&Flag> {
        self.flags.iter().find(|f| f.name() == name)
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Flag> {
        self.flags.iter_mut().find(|f| f.name() == name)
    }

    /// Set a flag as if it had been given on the command line.
    pub fn set(&mut self, name: &str, raw: &str) -> Result<()> {
        self.lookup_mut(name)
            .ok_or_else(|| BootstrapError::UnknownKey(name.to_string()))?
            .set(raw)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter()
    }

    pub fn get_bool(&self, name: &str) -> bool {
        self.lookup(name)
            .and_then(|f| f.value().as_bool())
            .unwrap_or(false)
    }

    pub fn get_int(&self, name: &str) -> i64 {
        self.lookup(name)
            .and_then(|f| f.value().as_int())
            .unwrap_or(0)
    }

    pub fn get_string(&self, name: &str) -> String {
        self.lookup(name)
            .map(|f| f.value().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Command;

    fn defs() -> Vec<FlagDef> {
        vec![
            FlagDef::new("v", 0i64, "log level for V logs"),
            FlagDef::new("alsologtostderr", false, "log to standard error as well as files"),
            FlagDef::new("log_dir", "/tmp/logs", "log directory"),
        ]
    }

    fn parse(args: &[&str]) -> std::result::Result<FlagSet, clap::Error> {
        let cmd = Command::new("mk")
            .args(defs().iter().map(FlagDef::to_arg))
            .subcommand(Command::new("status"));
        let matches = cmd.try_get_matches_from(args)?;
        Ok(FlagSet::from_matches(defs(), &matches).unwrap())
    }

    #[test]
    fn unset_flags_keep_defaults() {
        let flags = parse(&["mk"]).unwrap();
        assert_eq!(flags.get_int("v"), 0);
        assert!(!flags.lookup("v").unwrap().changed());
        assert_eq!(flags.get_string("log_dir"), "/tmp/logs");
    }

    #[test]
    fn explicit_values_mark_changed() {
        let flags = parse(&["mk", "--v=4", "--log_dir", "/var/log"]).unwrap();
        assert_eq!(flags.get_int("v"), 4);
        assert!(flags.lookup("v").unwrap().changed());
        assert_eq!(flags.get_string("log_dir"), "/var/log");
        assert!(!flags.lookup("alsologtostderr").unwrap().changed());
    }

    #[test]
    fn bare_bool_flag_is_true() {
        let flags = parse(&["mk", "--alsologtostderr"]).unwrap();
        assert!(flags.get_bool("alsologtostderr"));
        let flags = parse(&["mk", "--alsologtostderr=false"]).unwrap();
        assert!(!flags.get_bool("alsologtostderr"));
        assert!(flags.lookup("alsologtostderr").unwrap().changed());
    }

    #[test]
    fn flags_are_global() {
        let flags = parse(&["mk", "status", "--v=2"]).unwrap();
        assert_eq!(flags.get_int("v"), 2);
    }

    #[test]
    fn bad_int_is_rejected_by_parser() {
        assert!(parse(&["mk", "--v=lots"]).is_err());
    }

    #[test]
    fn set_rejects_wrong_kind() {
        let mut flags = FlagSet::new(defs());
        assert!(flags.set("v", "x").is_err());
        assert!(!flags.lookup("v").unwrap().changed());
        assert!(matches!(flags.set("nope", "1"), Err(BootstrapError::UnknownKey(_))));
    }

    #[test]
    fn extend_keeps_first_definition() {
        let mut flags = FlagSet::new(defs());
        flags.extend([FlagDef::new("v", 9i64, "dup")]);
        assert_eq!(flags.iter().count(), 3);
        assert_eq!(flags.get_int("v"), 0);
    }
}
