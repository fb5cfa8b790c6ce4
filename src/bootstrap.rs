//! One-time startup sequence run before any subcommand.
//!
//! The steps run in a fixed order:
//! 1. provision the minikube directories (fatal on failure)
//! 2. load the config file, bind the environment and resolve flags, holding
//!    back any warnings until logging is set up
//! 3. warn about deprecated flags
//! 4. pick the machine client type
//! 5. install log output, gating libmachine logs on verbosity
//! 6. start the update and kubectl notices in the background
//!
//! The result is a [`RuntimeConfig`] that subcommands receive by reference.

use crate::cli::{ROOT_FLAG_NAMES, SHOW_LIBMACHINE_LOGS_FLAG};
use crate::config::keys::KNOWN_KEYS;
use crate::config::{
    ConfigStore, ENV_PREFIX, EnvBinder, FLAG_WHITELIST, bind_flags, check_collisions,
    check_whitelist, resolve_whitelisted,
};
use crate::error::Result;
use crate::flags::FlagSet;
use crate::logging::{self, DeferredWarnings, LogSettings};
use crate::machine::ClientType;
use crate::notify::{NoReleaseSource, NoticeHandle, NoticeSettings, Notices, ReleaseSource, Version};
use crate::paths::MiniPaths;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Printed when `--show-libmachine-logs` is set.
pub const SHOW_LIBMACHINE_LOGS_DEPRECATION: &str = "\
--show-libmachine-logs is deprecated.
Please use --v=3 to show libmachine logs, and --v=7 for debug level libmachine logs";

/// Version of the running binary.
pub fn current_version() -> Version {
    env!("CARGO_PKG_VERSION").parse().unwrap_or(Version {
        major: 0,
        minor: 0,
        patch: 0,
    })
}

/// Deprecation notice for the resolved configuration, if any applies.
pub fn deprecation_notice(store: &ConfigStore) -> Option<&'static str> {
    store
        .get_bool(SHOW_LIBMACHINE_LOGS_FLAG)
        .then_some(SHOW_LIBMACHINE_LOGS_DEPRECATION)
}

/// Fully resolved configuration, read-only once bootstrap has finished.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub paths: MiniPaths,
    pub store: ConfigStore,
    pub flags: FlagSet,
    pub client_type: ClientType,
    pub log_settings: LogSettings,
}

/// The startup sequencer. [`Bootstrap::run`] does its work once; later calls
/// return the configuration from the first run.
pub struct Bootstrap {
    paths: MiniPaths,
    env: EnvBinder,
    whitelist: &'static [&'static str],
    bound_flags: &'static [&'static str],
    release_source: Arc<dyn ReleaseSource>,
    install_logging: bool,
    notice_writer: Option<Box<dyn Write + Send>>,
    notice_timeout: Option<Duration>,
    notices: Option<NoticeHandle>,
    /// `None` until the sequence has run, then the configuration it produced.
    state: Option<Box<RuntimeConfig>>,
}

impl Bootstrap {
    pub fn new(paths: MiniPaths) -> Self {
        Self {
            paths,
            env: EnvBinder::from_process(ENV_PREFIX),
            whitelist: FLAG_WHITELIST,
            bound_flags: ROOT_FLAG_NAMES,
            release_source: Arc::new(NoReleaseSource),
            install_logging: true,
            notice_writer: None,
            notice_timeout: None,
            notices: None,
            state: None,
        }
    }

    /// Use `env` instead of the process environment.
    pub fn with_env(mut self, env: EnvBinder) -> Self {
        self.env = env;
        self
    }

    pub fn with_whitelist(mut self, whitelist: &'static [&'static str]) -> Self {
        self.whitelist = whitelist;
        self
    }

    pub fn with_release_source(mut self, source: Arc<dyn ReleaseSource>) -> Self {
        self.release_source = source;
        self
    }

    /// Write notices to `writer` instead of stderr.
    pub fn with_notice_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.notice_writer = Some(Box::new(writer));
        self
    }

    pub fn with_notice_timeout(mut self, timeout: Duration) -> Self {
        self.notice_timeout = Some(timeout);
        self
    }

    /// Leave the global log subscriber alone.
    pub fn without_logging(mut self) -> Self {
        self.install_logging = false;
        self
    }

    pub fn has_run(&self) -> bool {
        self.state.is_some()
    }

    /// Take the handle of the background notice task, if one was started.
    pub fn take_notices(&mut self) -> Option<NoticeHandle> {
        self.notices.take()
    }

    /// Run the startup sequence with the parsed flags.
    ///
    /// `show_notices` lets commands with machine-read output suppress the
    /// update and kubectl notices.
    pub fn run(&mut self, flags: FlagSet, show_notices: bool) -> Result<&RuntimeConfig> {
        let config = match self.state.take() {
            Some(config) => {
                debug!("Bootstrap already ran, reusing resolved configuration");
                config
            }
            None => Box::new(self.execute(flags, show_notices)?),
        };
        let config: &RuntimeConfig = self.state.insert(config);
        Ok(config)
    }

    fn execute(&mut self, mut flags: FlagSet, show_notices: bool) -> Result<RuntimeConfig> {
        self.paths.provision()?;

        let known = KNOWN_KEYS
            .iter()
            .map(|k| k.name)
            .chain(self.whitelist.iter().copied())
            .chain(self.bound_flags.iter().copied());
        check_collisions(ENV_PREFIX, known)?;
        check_whitelist(&flags, self.whitelist)?;

        let deferred = DeferredWarnings::new();
        let capture = deferred.capture();
        let mut store = ConfigStore::new(std::mem::take(&mut self.env)).with_known_defaults();
        store.load_file(&self.paths.config_file());
        bind_flags(&mut store, &flags, self.bound_flags.iter().copied())?;
        resolve_whitelisted(&mut store, &mut flags, self.whitelist)?;

        if let Some(notice) = deprecation_notice(&store) {
            eprintln!("\n{notice}\n");
        }

        let client_type = ClientType::from_config(&store);

        let log_settings = LogSettings::from_flags(&flags);
        drop(capture);
        if self.install_logging && !logging::install(&log_settings) {
            debug!("Log subscriber already installed");
        }
        deferred.replay();
        info!(
            root = %self.paths.root().display(),
            client = %client_type,
            verbosity = log_settings.verbosity,
            "Bootstrap complete"
        );

        if show_notices {
            let settings = NoticeSettings::from_config(&store, &self.paths, current_version());
            let mut notices = Notices::new(settings, Arc::clone(&self.release_source));
            if let Some(timeout) = self.notice_timeout {
                notices = notices.with_timeout(timeout);
            }
            let writer = self
                .notice_writer
                .take()
                .unwrap_or_else(|| Box::new(std::io::stderr()));
            self.notices = notices.spawn(writer);
            if self.notices.is_none() {
                warn!("Startup notices were not started");
            }
        }

        Ok(RuntimeConfig {
            paths: self.paths.clone(),
            store,
            flags,
            client_type,
            log_settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::root_flag_definitions;
    use tempfile::TempDir;

    fn flags(paths: &MiniPaths) -> FlagSet {
        let mut flags = FlagSet::new(root_flag_definitions());
        flags.extend(logging::flag_definitions(&paths.logs_dir()));
        flags
    }

    fn bootstrap(temp: &TempDir, vars: &[(&str, &str)]) -> Bootstrap {
        Bootstrap::new(MiniPaths::new(temp.path().join(".minikube")))
            .with_env(EnvBinder::from_vars(ENV_PREFIX, vars.iter().copied()))
            .without_logging()
    }

    #[test]
    fn second_run_reuses_first_result() {
        let temp = TempDir::new().unwrap();
        let mut boot = bootstrap(&temp, &[("MINIKUBE_V", "2")]);
        let paths = MiniPaths::new(temp.path().join(".minikube"));
        assert!(!boot.has_run());

        let first_v = boot.run(flags(&paths), false).unwrap().flags.get_int("v");
        assert!(boot.has_run());

        let mut other = flags(&paths);
        other.set("v", "9").unwrap();
        let second = boot.run(other, false).unwrap();
        assert_eq!(first_v, 2);
        assert_eq!(second.flags.get_int("v"), 2);
    }

    #[test]
    fn deprecated_flag_is_reported() {
        let temp = TempDir::new().unwrap();
        let paths = MiniPaths::new(temp.path().join(".minikube"));
        let mut flags = flags(&paths);
        flags.set(SHOW_LIBMACHINE_LOGS_FLAG, "true").unwrap();

        let mut boot = bootstrap(&temp, &[]);
        let config = boot.run(flags, false).unwrap();
        assert!(deprecation_notice(&config.store).is_some());
    }

    #[test]
    fn no_notices_without_runtime() {
        let temp = TempDir::new().unwrap();
        let paths = MiniPaths::new(temp.path().join(".minikube"));
        let mut boot = bootstrap(&temp, &[]);
        boot.run(flags(&paths), true).unwrap();
        assert!(boot.take_notices().is_none());
    }

    #[test]
    fn current_version_matches_package() {
        assert_eq!(
            current_version().to_string(),
            format!("v{}", env!("CARGO_PKG_VERSION"))
        );
    }
}
