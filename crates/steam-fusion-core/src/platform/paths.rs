//! Platform-specific Steam locations.

use crate::error::{FusionError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Install location used when the registry has no `SteamPath`.
#[cfg_attr(not(windows), allow(dead_code))]
const WINDOWS_FALLBACK_ROOT: &str = r"C:\Program Files (x86)\Steam";

/// Prefer the root Steam registered; blank values count as missing.
#[cfg_attr(not(windows), allow(dead_code))]
fn registered_or_fallback(registered: Option<String>) -> PathBuf {
    match registered.as_deref().map(str::trim) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => {
            debug!("No SteamPath registered, using {}", WINDOWS_FALLBACK_ROOT);
            PathBuf::from(WINDOWS_FALLBACK_ROOT)
        }
    }
}

/// `HKCU\Software\Valve\Steam\SteamPath`, if Steam wrote one.
#[cfg(target_os = "windows")]
fn registry_steam_path() -> Option<String> {
    use winreg::enums::HKEY_CURRENT_USER;
    use winreg::RegKey;

    let steam = RegKey::predef(HKEY_CURRENT_USER)
        .open_subkey(r"Software\Valve\Steam")
        .map_err(|e| debug!("Steam registry key unavailable: {}", e))
        .ok()?;
    steam
        .get_value::<String, _>("SteamPath")
        .map_err(|e| debug!("SteamPath registry value unavailable: {}", e))
        .ok()
}

/// Default Steam installation root.
///
/// # Platform Behavior
/// - **Windows**: `HKCU\Software\Valve\Steam\SteamPath`, falling back to
///   `C:\Program Files (x86)\Steam` when the value is missing or blank
/// - **Linux**: `~/.steam/steam`, falling back to `~/.local/share/Steam`
/// - **macOS**: `~/Library/Application Support/Steam`
pub fn default_steam_root() -> Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        Ok(registered_or_fallback(registry_steam_path()))
    }

    #[cfg(target_os = "linux")]
    {
        let home = dirs::home_dir().ok_or_else(|| FusionError::Config {
            message: "Could not determine home directory".to_string(),
        })?;
        let dot_steam = home.join(".steam").join("steam");
        if dot_steam.exists() {
            Ok(dot_steam)
        } else {
            Ok(home.join(".local").join("share").join("Steam"))
        }
    }

    #[cfg(target_os = "macos")]
    {
        let data_dir = dirs::data_dir().ok_or_else(|| FusionError::Config {
            message: "Could not determine app data directory".to_string(),
        })?;
        Ok(data_dir.join("Steam"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        Err(FusionError::SteamNotFound)
    }
}

/// Path of the Steam client executable inside `root`.
///
/// # Platform Behavior
/// - **Windows**: `{root}\steam.exe`
/// - **Linux**: `{root}/steam.sh`
/// - **macOS**: `{root}/Steam.AppBundle/Steam/Contents/MacOS/steam_osx`
pub fn steam_executable(root: &Path) -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        root.join("steam.exe")
    }

    #[cfg(target_os = "macos")]
    {
        root.join("Steam.AppBundle")
            .join("Steam")
            .join("Contents")
            .join("MacOS")
            .join("steam_osx")
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        root.join("steam.sh")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steam_executable_is_inside_root() {
        let root = Path::new("/opt/steam");
        assert!(steam_executable(root).starts_with(root));
    }

    #[test]
    fn test_registered_root_wins() {
        assert_eq!(
            registered_or_fallback(Some("d:/games/steam".into())),
            PathBuf::from("d:/games/steam")
        );
    }

    #[test]
    fn test_missing_or_blank_registry_value_falls_back() {
        assert_eq!(
            registered_or_fallback(None),
            PathBuf::from(WINDOWS_FALLBACK_ROOT)
        );
        assert_eq!(
            registered_or_fallback(Some("  ".into())),
            PathBuf::from(WINDOWS_FALLBACK_ROOT)
        );
    }

    #[cfg(any(target_os = "linux", target_os = "windows", target_os = "macos"))]
    #[test]
    fn test_default_root_is_absolute() {
        let root = default_steam_root().unwrap();
        assert!(root.is_absolute());
    }
}
