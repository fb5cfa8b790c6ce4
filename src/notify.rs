//! Startup notices: newer-release reminders and the kubectl download hint.
//!
//! Both run in one background task with a hard deadline. Their output is
//! advisory: lookup failures are logged at debug level and a timeout simply
//! drops whatever had not been printed yet.

use crate::config::ConfigStore;
use crate::config::keys::{
    REMINDER_WAIT_PERIOD_IN_HOURS, WANT_KUBECTL_DOWNLOAD_MSG, WANT_UPDATE_NOTIFICATION,
};
use crate::paths::MiniPaths;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Upper bound on the whole notice task.
pub const NOTICE_TIMEOUT: Duration = Duration::from_secs(5);

const RELEASES_URL: &str = "https://github.com/kubernetes/minikube/releases/tag";
const KUBECTL_RELEASE_URL: &str = "https://storage.googleapis.com/kubernetes-release/release";
const DEFAULT_KUBECTL_VERSION: &str = "v1.6.0";

/// Where the latest released version comes from.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn latest_version(&self) -> anyhow::Result<String>;
}

/// Release source used when no lookup is wired in. Always fails, which turns
/// the update check into a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReleaseSource;

#[async_trait]
impl ReleaseSource for NoReleaseSource {
    async fn latest_version(&self) -> anyhow::Result<String> {
        Err(anyhow::anyhow!("no release source configured"))
    }
}

/// A `major.minor.patch` version, optionally written with a leading `v` and a
/// pre-release or build suffix, which is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let core = trimmed
            .strip_prefix('v')
            .unwrap_or(trimmed)
            .split(['-', '+'])
            .next()
            .unwrap_or_default();
        let mut parts = [0u64; 3];
        let mut count = 0;
        for (i, part) in core.split('.').enumerate() {
            if i >= 3 {
                return Err(format!("invalid version {s:?}"));
            }
            parts[i] = part.parse().map_err(|_| format!("invalid version {s:?}"))?;
            count += 1;
        }
        if count == 0 {
            return Err(format!("invalid version {s:?}"));
        }
        Ok(Self {
            major: parts[0],
            minor: parts[1],
            patch: parts[2],
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Notice options resolved from configuration.
#[derive(Debug, Clone)]
pub struct NoticeSettings {
    pub want_update_notification: bool,
    pub reminder_wait: ChronoDuration,
    pub want_kubectl_download_msg: bool,
    pub current_version: Version,
    pub last_check_file: PathBuf,
}

impl NoticeSettings {
    pub fn from_config(store: &ConfigStore, paths: &MiniPaths, current_version: Version) -> Self {
        Self {
            want_update_notification: store.get_bool(WANT_UPDATE_NOTIFICATION),
            reminder_wait: ChronoDuration::try_hours(store.get_int(REMINDER_WAIT_PERIOD_IN_HOURS))
                .unwrap_or(ChronoDuration::MAX),
            want_kubectl_download_msg: store.get_bool(WANT_KUBECTL_DOWNLOAD_MSG),
            current_version,
            last_check_file: paths.last_update_check_file(),
        }
    }
}

/// Whether enough time has passed since the last update check.
pub fn reminder_due(last_check: Option<DateTime<Utc>>, now: DateTime<Utc>, wait: ChronoDuration) -> bool {
    match last_check {
        Some(last) => now - last >= wait,
        None => true,
    }
}

fn read_last_check(path: &Path) -> Option<DateTime<Utc>> {
    let content = std::fs::read_to_string(path).ok()?;
    DateTime::parse_from_rfc3339(content.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn write_last_check(path: &Path, now: DateTime<Utc>) {
    if let Err(e) = std::fs::write(path, now.to_rfc3339()) {
        warn!(path = %path.display(), error = %e, "Unable to record update check time");
    }
}

/// Check for a newer release and build the upgrade notice if there is one.
pub async fn update_message(
    source: &dyn ReleaseSource,
    settings: &NoticeSettings,
    now: DateTime<Utc>,
) -> Option<String> {
    if !settings.want_update_notification {
        return None;
    }
    if !reminder_due(read_last_check(&settings.last_check_file), now, settings.reminder_wait) {
        debug!("Update check skipped, reminder period has not elapsed");
        return None;
    }

    let latest = match source.latest_version().await {
        Ok(raw) => match raw.parse::<Version>() {
            Ok(v) => v,
            Err(e) => {
                debug!(error = %e, "Unusable latest release version");
                return None;
            }
        },
        Err(e) => {
            debug!(error = %e, "Unable to look up latest release");
            return None;
        }
    };
    write_last_check(&settings.last_check_file, now);

    (latest > settings.current_version).then(|| {
        format!(
            "There is a newer version of minikube available ({latest}). Download it here:\n\
             {RELEASES_URL}/{latest}\n\n\
             To disable this notification, run the following:\n\
             minikube config set {WANT_UPDATE_NOTIFICATION} false\n"
        )
    })
}

fn kubectl_executable() -> &'static str {
    if cfg!(windows) { "kubectl.exe" } else { "kubectl" }
}

/// Whether a kubectl executable exists in any directory of `path_var`.
pub fn kubectl_on_path(path_var: Option<&OsStr>) -> bool {
    path_var
        .map(|paths| std::env::split_paths(paths).any(|dir| dir.join(kubectl_executable()).is_file()))
        .unwrap_or(false)
}

/// The kubectl install hint, when wanted and kubectl is not on `PATH`.
pub fn kubectl_message(want: bool, path_var: Option<&OsStr>) -> Option<String> {
    if !want || kubectl_on_path(path_var) {
        return None;
    }
    let os = std::env::consts::OS;
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => other,
    };
    let url = format!(
        "{KUBECTL_RELEASE_URL}/{DEFAULT_KUBECTL_VERSION}/bin/{os}/{arch}/{}",
        kubectl_executable()
    );
    let install = if cfg!(windows) {
        format!("Download kubectl from:\n{url}\nAdd kubectl to your system PATH")
    } else {
        format!(
            "curl -Lo kubectl {url} && chmod +x kubectl && sudo mv kubectl /usr/local/bin/"
        )
    };
    let rule = "=".repeat(40);
    Some(format!(
        "{rule}\n\
         kubectl could not be found on your path. kubectl is a requirement for using minikube\n\
         To install kubectl, please run the following:\n\n\
         {install}\n\n\
         To disable this message, run the following:\n\n\
         minikube config set {WANT_KUBECTL_DOWNLOAD_MSG} false\n\
         {rule}\n"
    ))
}

/// Both notice checks, ready to run in the background.
pub struct Notices {
    settings: NoticeSettings,
    source: Arc<dyn ReleaseSource>,
    path_var: Option<OsString>,
    timeout: Duration,
}

impl Notices {
    pub fn new(settings: NoticeSettings, source: Arc<dyn ReleaseSource>) -> Self {
        Self {
            settings,
            source,
            path_var: std::env::var_os("PATH"),
            timeout: NOTICE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_path_var(mut self, path_var: Option<OsString>) -> Self {
        self.path_var = path_var;
        self
    }

    /// Spawn the checks on the current tokio runtime, writing notices to `out`.
    ///
    /// Returns `None` without doing anything when there is no runtime.
    pub fn spawn<W>(self, mut out: W) -> Option<NoticeHandle>
    where
        W: Write + Send + 'static,
    {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                debug!("No async runtime, skipping startup notices");
                return None;
            }
        };
        let task = handle.spawn(async move {
            let deadline = self.timeout;
            let checks = async {
                if let Some(msg) = kubectl_message(
                    self.settings.want_kubectl_download_msg,
                    self.path_var.as_deref(),
                ) {
                    let _ = out.write_all(msg.as_bytes());
                }
                if let Some(msg) = update_message(self.source.as_ref(), &self.settings, Utc::now()).await {
                    let _ = out.write_all(msg.as_bytes());
                }
                let _ = out.flush();
            };
            if tokio::time::timeout(deadline, checks).await.is_err() {
                debug!(timeout_ms = deadline.as_millis() as u64, "Startup notices timed out");
            }
        });
        Some(NoticeHandle(task))
    }
}

/// Handle to the spawned notice task.
pub struct NoticeHandle(JoinHandle<()>);

impl NoticeHandle {
    /// Wait for the task. Bounded by the task's own deadline.
    pub async fn finish(self) {
        let _ = self.0.await;
    }

    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}
