//! Filesystem layout of the minikube home directory.
//!
//! Everything the tool persists lives below a single root, `~/.minikube` by
//! default. The root and its fixed subdirectories are provisioned before any
//! command runs, so the rest of the tool can assume they exist.

use crate::error::{BootstrapError, Result};
use std::fs::DirBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable that relocates the minikube home.
pub const MINIKUBE_HOME_ENV: &str = "MINIKUBE_HOME";

/// Name of the root directory under the home.
const ROOT_DIR_NAME: &str = ".minikube";

/// Subdirectories created under the root, in creation order.
const SUBDIRS: &[&[&str]] = &[
    &["certs"],
    &["machines"],
    &["cache"],
    &["cache", "iso"],
    &["cache", "localkube"],
    &["config"],
    &["addons"],
    &["logs"],
];

/// Resolved locations under the minikube root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiniPaths {
    root: PathBuf,
}

impl MiniPaths {
    /// Use `root` as the minikube directory itself.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Discover the root from `MINIKUBE_HOME` or the user's home directory.
    pub fn discover() -> Result<Self> {
        let home = std::env::var_os(MINIKUBE_HOME_ENV)
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .ok_or(BootstrapError::NoHomeDir)?;
        Ok(Self::new(home.join(ROOT_DIR_NAME)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join path segments onto the root.
    pub fn join<I, S>(&self, parts: I) -> PathBuf
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        parts
            .into_iter()
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }

    pub fn config_file(&self) -> PathBuf {
        self.join(["config", "config.json"])
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.join(["logs"])
    }

    /// File recording when the update check last ran.
    pub fn last_update_check_file(&self) -> PathBuf {
        self.join(["last_update_check"])
    }

    /// The ordered list of directories that must exist before a command runs.
    pub fn required_dirs(&self) -> Vec<PathBuf> {
        std::iter::once(self.root.clone())
            .chain(SUBDIRS.iter().map(|parts| self.join(parts.iter())))
            .collect()
    }

    /// Create every required directory, including missing ancestors.
    ///
    /// Idempotent: directories that already exist are left alone. The first
    /// creation failure is returned and nothing after it is attempted.
    pub fn provision(&self) -> Result<()> {
        for path in self.required_dirs() {
            create_dir_all_permissive(&path).map_err(|source| BootstrapError::CreateDir {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "Ensured directory");
        }
        Ok(())
    }
}

#[cfg(unix)]
fn create_dir_all_permissive(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    DirBuilder::new().recursive(true).mode(0o777).create(path)
}

#[cfg(not(unix))]
fn create_dir_all_permissive(path: &Path) -> std::io::Result<()> {
    DirBuilder::new().recursive(true).create(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn required_dirs_start_with_root() {
        let paths = MiniPaths::new("/tmp/mk");
        let dirs = paths.required_dirs();
        assert_eq!(dirs[0], PathBuf::from("/tmp/mk"));
        assert_eq!(dirs.len(), 9);
        assert!(dirs.contains(&PathBuf::from("/tmp/mk/cache/localkube")));
        assert_eq!(dirs.last(), Some(&PathBuf::from("/tmp/mk/logs")));
    }

    #[test]
    fn config_file_lives_in_config_dir() {
        let paths = MiniPaths::new("/tmp/mk");
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/mk/config/config.json"));
    }

    #[test]
    fn provision_creates_missing_ancestors() {
        let temp = TempDir::new().unwrap();
        let paths = MiniPaths::new(temp.path().join("a").join("b").join(".minikube"));
        paths.provision().unwrap();
        for dir in paths.required_dirs() {
            assert!(dir.is_dir(), "{} should exist", dir.display());
        }
    }

    #[test]
    fn provision_twice_is_a_no_op() {
        let temp = TempDir::new().unwrap();
        let paths = MiniPaths::new(temp.path().join(".minikube"));
        paths.provision().unwrap();
        paths.provision().unwrap();
        assert!(paths.join(["cache", "iso"]).is_dir());
    }

    #[test]
    fn provision_fails_when_a_file_blocks_the_path() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join(".minikube");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("certs"), b"not a dir").unwrap();

        let err = MiniPaths::new(&root).provision().unwrap_err();
        match err {
            BootstrapError::CreateDir { path, .. } => assert_eq!(path, root.join("certs")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
