//! Log output setup.
//!
//! The logging layer owns three flags, `--v`, `--alsologtostderr` and
//! `--log_dir`, which it hands to the command dispatcher as a plain flag set.
//! Once those flags are resolved, [`install`] builds the global `tracing`
//! subscriber:
//!
//! - a file layer writing `<log_dir>/minikube.log` when a log directory is set
//! - a stderr layer that mirrors the file filter with `--alsologtostderr`,
//!   and otherwise only shows errors
//!
//! Verbosity also decides what happens to the `libmachine` target used by the
//! machine drivers: dropped below 3, info from 3, debug from 7. This holds for
//! both sinks.
//!
//! Warnings raised while the flags are still being resolved happen before any
//! subscriber exists. [`DeferredWarnings`] holds them until [`install`] has run.

use crate::flags::{FlagDef, FlagSet};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::level_filters::LevelFilter;
use tracing::subscriber::DefaultGuard;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const VERBOSITY_FLAG: &str = "v";
pub const ALSO_LOG_TO_STDERR_FLAG: &str = "alsologtostderr";
pub const LOG_DIR_FLAG: &str = "log_dir";

/// Target used by the machine driver subsystem.
pub const LIBMACHINE_TARGET: &str = "libmachine";

/// Verbosity at which libmachine logs are shown.
pub const LIBMACHINE_LOGS_LEVEL: i64 = 3;
/// Verbosity at which libmachine debug logs are shown.
pub const LIBMACHINE_DEBUG_LEVEL: i64 = 7;

const LOG_FILE_NAME: &str = "minikube.log";

/// The logging flag set, with `log_dir` defaulting to `default_log_dir`.
pub fn flag_definitions(default_log_dir: &Path) -> Vec<FlagDef> {
    vec![
        FlagDef::new(VERBOSITY_FLAG, 0i64, "log level for V logs"),
        FlagDef::new(
            ALSO_LOG_TO_STDERR_FLAG,
            false,
            "log to standard error as well as files",
        ),
        FlagDef::new(
            LOG_DIR_FLAG,
            default_log_dir.to_string_lossy().into_owned(),
            "If non-empty, write log files in this directory",
        ),
    ]
}

/// Resolved logging options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub verbosity: i64,
    pub also_log_to_stderr: bool,
    pub log_dir: Option<PathBuf>,
}

impl LogSettings {
    pub fn from_flags(flags: &FlagSet) -> Self {
        let log_dir = flags.get_string(LOG_DIR_FLAG);
        Self {
            verbosity: flags.get_int(VERBOSITY_FLAG),
            also_log_to_stderr: flags.get_bool(ALSO_LOG_TO_STDERR_FLAG),
            log_dir: (!log_dir.is_empty()).then(|| PathBuf::from(log_dir)),
        }
    }

    pub fn routing(&self) -> LogRouting {
        LogRouting::for_verbosity(self.verbosity)
    }
}

/// What happens to libmachine output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibmachineLogs {
    Discard,
    Info,
    Debug,
}

impl LibmachineLogs {
    pub fn for_verbosity(verbosity: i64) -> Self {
        if verbosity >= LIBMACHINE_DEBUG_LEVEL {
            LibmachineLogs::Debug
        } else if verbosity >= LIBMACHINE_LOGS_LEVEL {
            LibmachineLogs::Info
        } else {
            LibmachineLogs::Discard
        }
    }

    fn directive_level(self) -> &'static str {
        match self {
            LibmachineLogs::Discard => "off",
            LibmachineLogs::Info => "info",
            LibmachineLogs::Debug => "debug",
        }
    }
}

/// Filter levels derived from verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRouting {
    pub level: LevelFilter,
    pub libmachine: LibmachineLogs,
}

impl LogRouting {
    pub fn for_verbosity(verbosity: i64) -> Self {
        let level = match verbosity {
            i64::MIN..=0 => LevelFilter::INFO,
            1..=4 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        };
        Self {
            level,
            libmachine: LibmachineLogs::for_verbosity(verbosity),
        }
    }

    /// Directive applied to the libmachine target.
    pub fn libmachine_directive(&self) -> String {
        format!("{}={}", LIBMACHINE_TARGET, self.libmachine.directive_level())
    }

    /// Build the filter. `RUST_LOG` directives are applied on top.
    pub fn env_filter(&self) -> EnvFilter {
        let filter = EnvFilter::builder()
            .with_default_directive(self.level.into())
            .from_env_lossy();
        match self.libmachine_directive().parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        }
    }

    /// Filter for the stderr sink. Without `--alsologtostderr` only errors
    /// get through, and libmachine stays silent while it is discarded.
    pub fn stderr_filter(&self, also_log_to_stderr: bool) -> EnvFilter {
        if also_log_to_stderr {
            return self.env_filter();
        }
        match self.libmachine {
            LibmachineLogs::Discard => EnvFilter::new(format!("error,{}", self.libmachine_directive())),
            LibmachineLogs::Info | LibmachineLogs::Debug => EnvFilter::new("error"),
        }
    }
}

/// Warnings recorded before the global subscriber is installed.
///
/// [`capture`](Self::capture) routes this thread's events at `WARN` and above
/// into a buffer until the guard drops. [`replay`](Self::replay) re-emits them
/// through whatever subscriber is current by then.
#[derive(Debug, Clone, Default)]
pub struct DeferredWarnings {
    buf: Arc<Mutex<Vec<u8>>>,
}

struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl DeferredWarnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start buffering. Events are buffered until the returned guard drops.
    pub fn capture(&self) -> DefaultGuard {
        let buf = Arc::clone(&self.buf);
        let subscriber = fmt()
            .with_writer(move || BufferWriter(Arc::clone(&buf)))
            .with_ansi(false)
            .without_time()
            .with_level(false)
            .with_max_level(LevelFilter::WARN)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Emit every buffered warning and clear the buffer. Returns how many
    /// were emitted.
    pub fn replay(&self) -> usize {
        let content = std::mem::take(&mut *self.buf.lock().unwrap_or_else(PoisonError::into_inner));
        let text = String::from_utf8_lossy(&content);
        let mut count = 0;
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            warn!("{line}");
            count += 1;
        }
        count
    }
}

/// Install the global subscriber. Returns `false` if one was already installed,
/// in which case nothing changes.
pub fn install(settings: &LogSettings) -> bool {
    let routing = settings.routing();

    let mut file_error = None;
    let file = settings.log_dir.as_ref().and_then(|dir| {
        let opened = std::fs::create_dir_all(dir).and_then(|_| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(LOG_FILE_NAME))
        });
        match opened {
            Ok(file) => Some(file),
            Err(e) => {
                file_error = Some((dir.clone(), e));
                None
            }
        }
    });

    let file_layer = file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(routing.env_filter())
    });
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(routing.stderr_filter(settings.also_log_to_stderr));

    let installed = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if let Some((dir, e)) = file_error {
        warn!(dir = %dir.display(), error = %e, "Unable to open log file");
    }
    installed
}
