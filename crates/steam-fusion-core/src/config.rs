//! Centralized configuration for Steam Fusion.
//!
//! Constants for polling cadence and Steam/switcher conventions, plus the
//! user-facing [`LibrarySettings`] that controllers snapshot at construction.

use crate::error::{FusionError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Polling cadence and timeout defaults.
pub struct PollingConfig;

impl PollingConfig {
    pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 1000;
    pub const DEFAULT_SWITCH_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_LAUNCH_TIMEOUT_SECS: u64 = 30;
    /// Continuous absence required before a game process counts as ended.
    pub const GAME_STABILIZATION_WINDOW: Duration = Duration::from_millis(2000);
    /// Uninstall monitoring polls this many times slower than the base interval.
    pub const UNINSTALL_POLL_MULTIPLIER: u32 = 10;
}

/// Steam client conventions.
pub struct SteamConfig;

impl SteamConfig {
    /// Process name stem of the Steam client.
    pub const CLIENT_PROCESS_NAME: &'static str = "steam";
    pub const LOGIN_USERS_FILE: &'static str = "loginusers.vdf";
    pub const LIBRARY_FOLDERS_FILE: &'static str = "libraryfolders.vdf";
    pub const APP_MANIFEST_PREFIX: &'static str = "appmanifest_";
    pub const APP_MANIFEST_EXTENSION: &'static str = "acf";
    pub const STEAMAPPS_DIR_NAME: &'static str = "steamapps";
    pub const COMMON_DIR_NAME: &'static str = "common";
    pub const CONFIG_DIR_NAME: &'static str = "config";
}

/// Account switch tool conventions.
pub struct SwitcherConfig;

impl SwitcherConfig {
    pub const PORTABLE_INSTALLATION_DIR: &'static str = "TcNoAccountSwitcher";
    pub const TOOL_EXECUTABLE: &'static str = "TcNo-Acc-Switcher.exe";
    pub const VERSION_FILE: &'static str = "version";
}

/// Immutable polling cadence for one process watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingPolicy {
    pub polling_interval: Duration,
    pub start_timeout: Duration,
    pub stabilization_window: Duration,
}

impl PollingPolicy {
    pub fn new(
        polling_interval: Duration,
        start_timeout: Duration,
        stabilization_window: Duration,
    ) -> Self {
        Self {
            polling_interval,
            start_timeout,
            stabilization_window,
        }
    }
}

/// User settings consumed by the orchestration core.
///
/// Values are read-only for the duration of an action; controllers clone the
/// settings when they are constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibrarySettings {
    /// Path to the account switch tool executable.
    pub launcher_location: Option<PathBuf>,
    /// Steam installation root; platform default when unset.
    pub steam_path: Option<PathBuf>,
    pub polling_interval_ms: u64,
    pub switch_timeout_secs: u64,
    pub launch_timeout_secs: u64,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            launcher_location: None,
            steam_path: None,
            polling_interval_ms: PollingConfig::DEFAULT_POLLING_INTERVAL_MS,
            switch_timeout_secs: PollingConfig::DEFAULT_SWITCH_TIMEOUT_SECS,
            launch_timeout_secs: PollingConfig::DEFAULT_LAUNCH_TIMEOUT_SECS,
        }
    }
}

impl LibrarySettings {
    /// Load settings from a JSON file, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content =
            fs::read_to_string(path).map_err(|e| FusionError::io_with_path(e, path))?;
        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the polling loops cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.polling_interval_ms == 0 {
            return Err(FusionError::Config {
                message: "pollingIntervalMs must be greater than zero".into(),
            });
        }
        if self.launcher_location.is_none() {
            warn!("launcherLocation is not set; account switching will fail");
        }
        Ok(())
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }

    pub fn switch_timeout(&self) -> Duration {
        Duration::from_secs(self.switch_timeout_secs)
    }

    pub fn launch_timeout(&self) -> Duration {
        Duration::from_secs(self.launch_timeout_secs)
    }

    pub fn uninstall_polling_interval(&self) -> Duration {
        self.polling_interval() * PollingConfig::UNINSTALL_POLL_MULTIPLIER
    }

    /// Polling policy for watching a game process after launch.
    pub fn game_polling_policy(&self) -> PollingPolicy {
        PollingPolicy::new(
            self.polling_interval(),
            self.launch_timeout(),
            PollingConfig::GAME_STABILIZATION_WINDOW,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = LibrarySettings::default();
        assert_eq!(settings.polling_interval(), Duration::from_secs(1));
        assert_eq!(settings.switch_timeout(), Duration::from_secs(30));
        assert_eq!(settings.launch_timeout(), Duration::from_secs(30));
        assert_eq!(settings.uninstall_polling_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = LibrarySettings::load(temp_dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, LibrarySettings::default());
    }

    #[test]
    fn test_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"launcherLocation": "C:\\Tools\\TcNo-Acc-Switcher.exe", "pollingIntervalMs": 250}"#,
        )
        .unwrap();

        let settings = LibrarySettings::load(&path).unwrap();
        assert_eq!(settings.polling_interval(), Duration::from_millis(250));
        assert_eq!(settings.launch_timeout_secs, 30);
        assert_eq!(
            settings.launcher_location,
            Some(PathBuf::from("C:\\Tools\\TcNo-Acc-Switcher.exe"))
        );
    }

    #[test]
    fn test_zero_polling_interval_rejected() {
        let settings = LibrarySettings {
            polling_interval_ms: 0,
            ..LibrarySettings::default()
        };
        assert!(matches!(settings.validate(), Err(FusionError::Config { .. })));
    }

    #[test]
    fn test_game_polling_policy() {
        let policy = LibrarySettings::default().game_polling_policy();
        assert_eq!(policy.start_timeout, Duration::from_secs(30));
        assert_eq!(policy.stabilization_window, Duration::from_millis(2000));
    }
}
