//! Account switch tool installation metadata.

use crate::config::SwitcherConfig;
use crate::error::{FusionError, Result};
use crate::models::AccountId;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A portable TcNo Account Switcher installation under an installation root.
#[derive(Debug, Clone)]
pub struct SwitcherTool {
    install_dir: PathBuf,
}

impl SwitcherTool {
    pub fn new(installation_root: impl AsRef<Path>) -> Self {
        Self {
            install_dir: installation_root
                .as_ref()
                .join(SwitcherConfig::PORTABLE_INSTALLATION_DIR),
        }
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Path of the switch tool executable; it may not exist yet.
    pub fn executable_path(&self) -> PathBuf {
        self.install_dir.join(SwitcherConfig::TOOL_EXECUTABLE)
    }

    pub fn is_installed(&self) -> bool {
        self.executable_path().is_file()
    }

    /// Installed version as recorded in the `version` file, trimmed.
    pub fn local_version(&self) -> Result<Option<String>> {
        let path = self.install_dir.join(SwitcherConfig::VERSION_FILE);
        if !path.exists() {
            debug!("No switch tool version file at {}", path.display());
            return Ok(None);
        }

        let version = fs::read_to_string(&path).map_err(|e| FusionError::io_with_path(e, &path))?;
        Ok(Some(version.trim().to_string()))
    }
}

/// Arguments that ask the tool to sign Steam into `account` without a window.
pub fn switch_arguments(account: &AccountId) -> Vec<String> {
    vec![format!("+s:{account}"), "-silent".to_string()]
}

/// Whether `candidate` is newer than `current`.
///
/// Release tags are sortable (`yyyy-MM-dd_##`), so a plain ordinal comparison
/// is enough. A blank candidate is never newer; anything beats a blank current.
pub fn is_newer_version(candidate: Option<&str>, current: Option<&str>) -> bool {
    let candidate = candidate.map(str::trim).filter(|v| !v.is_empty());
    let current = current.map(str::trim).filter(|v| !v.is_empty());

    match (candidate, current) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(candidate), Some(current)) => candidate > current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_newer_release_tag() {
        assert!(is_newer_version(Some("2024-01-02_01"), Some("2024-01-01_09")));
        assert!(!is_newer_version(Some("2024-01-01_09"), Some("2024-01-02_01")));
        assert!(!is_newer_version(Some("2024-01-01_09"), Some("2024-01-01_09")));
    }

    #[test]
    fn test_blank_versions() {
        assert!(!is_newer_version(None, None));
        assert!(!is_newer_version(Some("  "), Some("")));
        assert!(!is_newer_version(None, Some("2024-01-01_09")));
        assert!(is_newer_version(Some("2024-01-01_09"), None));
        assert!(is_newer_version(Some("2024-01-01_09"), Some(" ")));
    }

    #[test]
    fn test_switch_arguments() {
        assert_eq!(
            switch_arguments(&AccountId::new("76561198000000001")),
            vec!["+s:76561198000000001".to_string(), "-silent".to_string()]
        );
    }

    #[test]
    fn test_paths_and_local_version() {
        let temp_dir = TempDir::new().unwrap();
        let tool = SwitcherTool::new(temp_dir.path());

        assert!(tool
            .executable_path()
            .ends_with("TcNoAccountSwitcher/TcNo-Acc-Switcher.exe"));
        assert!(!tool.is_installed());
        assert_eq!(tool.local_version().unwrap(), None);

        fs::create_dir_all(tool.install_dir()).unwrap();
        fs::write(tool.install_dir().join("version"), "2024-01-02_01\n").unwrap();
        assert_eq!(tool.local_version().unwrap().as_deref(), Some("2024-01-02_01"));
    }
}
