//! [`GameClientService`] backed by a local Steam installation.

use super::cache::ModifiedCache;
use super::manifest;
use super::GameClientService;
use crate::config::{LibrarySettings, SteamConfig};
use crate::error::{FusionError, Result};
use crate::models::{AccountId, InstalledGame, TitleId};
use crate::platform;
use crate::process::spawn_detached;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, error, info, warn};

/// Reads Steam's on-disk state and drives the client through `steam://` URIs.
pub struct SteamLocalService {
    steam_root: PathBuf,
    executable: PathBuf,
    active_account: ModifiedCache<Option<AccountId>>,
    /// Keyed on the newest mtime and the manifest count, so removed
    /// manifests invalidate the cache too.
    installed: ModifiedCache<Vec<InstalledGame>, (SystemTime, usize)>,
}

impl SteamLocalService {
    pub fn new(steam_root: impl Into<PathBuf>) -> Self {
        let steam_root = steam_root.into();
        let executable = platform::steam_executable(&steam_root);
        Self {
            steam_root,
            executable,
            active_account: ModifiedCache::new(),
            installed: ModifiedCache::new(),
        }
    }

    /// Use the configured Steam root, or the platform default.
    pub fn from_settings(settings: &LibrarySettings) -> Result<Self> {
        let root = match &settings.steam_path {
            Some(path) => path.clone(),
            None => platform::default_steam_root()?,
        };
        info!("Using Steam installation at {}", root.display());
        Ok(Self::new(root))
    }

    /// Override the executable used for `steam://` commands.
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn steam_root(&self) -> &Path {
        &self.steam_root
    }

    fn login_users_path(&self) -> PathBuf {
        self.steam_root
            .join(SteamConfig::CONFIG_DIR_NAME)
            .join(SteamConfig::LOGIN_USERS_FILE)
    }

    fn library_folders_path(&self) -> PathBuf {
        self.steam_root
            .join(SteamConfig::STEAMAPPS_DIR_NAME)
            .join(SteamConfig::LIBRARY_FOLDERS_FILE)
    }

    fn run(&self, args: Vec<String>) -> bool {
        match spawn_detached(&self.executable, &args) {
            Ok(()) => true,
            Err(e) => {
                error!("Steam command {:?} failed: {}", args, e);
                false
            }
        }
    }

    fn read_installed_games(
        &self,
        libraries: &[PathBuf],
        manifests: &[(PathBuf, PathBuf)],
    ) -> Vec<InstalledGame> {
        debug!(
            "Reading {} app manifests across {} libraries",
            manifests.len(),
            libraries.len()
        );

        let mut games = Vec::with_capacity(manifests.len());
        for (library, manifest_path) in manifests {
            let parsed = fs::read_to_string(manifest_path)
                .map_err(|e| FusionError::io_with_path(e, manifest_path))
                .and_then(|text| manifest::parse_app_manifest(&text, manifest_path, library));
            match parsed {
                Ok(game) => games.push(game),
                Err(e) => warn!("Skipping app manifest: {}", e),
            }
        }
        games
    }
}

fn modified(path: &Path) -> Result<SystemTime> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| FusionError::io_with_path(e, path))
}

/// Every `appmanifest_*.acf` in a library's `steamapps` directory.
fn app_manifests(library: &Path) -> Vec<PathBuf> {
    let steamapps = library.join(SteamConfig::STEAMAPPS_DIR_NAME);
    let entries = match fs::read_dir(&steamapps) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot list {}: {}", steamapps.display(), e);
            return Vec::new();
        }
    };

    let mut manifests: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            let is_manifest = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(SteamConfig::APP_MANIFEST_PREFIX));
            let has_extension = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(SteamConfig::APP_MANIFEST_EXTENSION));
            is_manifest && has_extension && path.is_file()
        })
        .collect();
    manifests.sort();
    manifests
}

#[async_trait]
impl GameClientService for SteamLocalService {
    async fn installed_games(&self) -> Result<Vec<InstalledGame>> {
        let config_path = self.library_folders_path();
        if !config_path.exists() {
            debug!("No library folders at {}", config_path.display());
            self.installed.invalidate();
            return Ok(Vec::new());
        }

        let text =
            fs::read_to_string(&config_path).map_err(|e| FusionError::io_with_path(e, &config_path))?;
        let libraries = manifest::parse_library_folders(&text, &config_path)?;

        let mut newest = modified(&config_path)?;
        let mut manifests = Vec::new();
        for library in &libraries {
            for manifest_path in app_manifests(library) {
                if let Ok(stamp) = modified(&manifest_path) {
                    newest = newest.max(stamp);
                }
                manifests.push((library.clone(), manifest_path));
            }
        }

        self.installed.get_or_refresh((newest, manifests.len()), || {
            Ok(self.read_installed_games(&libraries, &manifests))
        })
    }

    async fn active_account_id(&self) -> Result<Option<AccountId>> {
        let path = self.login_users_path();
        if !path.exists() {
            debug!("No login users file at {}", path.display());
            self.active_account.invalidate();
            return Ok(None);
        }

        let stamp = modified(&path)?;
        self.active_account.get_or_refresh(stamp, || {
            let text = fs::read_to_string(&path).map_err(|e| FusionError::io_with_path(e, &path))?;
            manifest::parse_login_users(&text, &path)
        })
    }

    async fn launch_title(&self, title: &TitleId) -> Result<bool> {
        info!("Launching Steam title {}", title);
        Ok(self.run(vec![
            "-silent".to_string(),
            format!("steam://rungameid/{title}"),
        ]))
    }

    async fn install_title(&self, title: &TitleId) -> Result<bool> {
        info!("Requesting install of Steam title {}", title);
        Ok(self.run(vec![format!("steam://install/{title}")]))
    }

    async fn uninstall_title(&self, title: &TitleId) -> Result<bool> {
        info!("Requesting uninstall of Steam title {}", title);
        Ok(self.run(vec![format!("steam://uninstall/{title}")]))
    }

    async fn install_info(&self, title: &TitleId) -> Result<Option<InstalledGame>> {
        let games = self.installed_games().await?;
        Ok(games.into_iter().find(|game| &game.id == title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, text: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn steam_root_with_library() -> (TempDir, SteamLocalService) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("Steam");
        let library = temp_dir.path().join("SteamLibrary");

        write(
            &root.join("steamapps").join("libraryfolders.vdf"),
            &format!(
                "\"libraryfolders\"\n{{\n\t\"0\"\n\t{{\n\t\t\"path\"\t\t\"{}\"\n\t}}\n}}\n",
                library.display().to_string().replace('\\', "\\\\")
            ),
        );
        write(
            &library.join("steamapps").join("appmanifest_440.acf"),
            "\"AppState\"\n{\n\t\"appid\"\t\t\"440\"\n\t\"name\"\t\t\"Team Fortress 2\"\n\t\"installdir\"\t\t\"Team Fortress 2\"\n}\n",
        );
        write(
            &library.join("steamapps").join("appmanifest_broken.acf"),
            "\"AppState\"\n{\n\t\"appid\"\t\t\"1\"\n}\n",
        );

        let service = SteamLocalService::new(&root);
        (temp_dir, service)
    }

    #[tokio::test]
    async fn test_installed_games_reads_libraries() {
        let (temp_dir, service) = steam_root_with_library();

        let games = service.installed_games().await.unwrap();

        assert_eq!(games.len(), 1);
        assert_eq!(games[0].id, TitleId::new("440"));
        assert_eq!(
            games[0].install_directory,
            temp_dir
                .path()
                .join("SteamLibrary")
                .join("steamapps")
                .join("common")
                .join("Team Fortress 2")
        );
    }

    #[tokio::test]
    async fn test_install_info() {
        let (_temp_dir, service) = steam_root_with_library();

        assert!(service.install_info(&TitleId::new("440")).await.unwrap().is_some());
        assert!(service.install_info(&TitleId::new("570")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_steam_files() {
        let temp_dir = TempDir::new().unwrap();
        let service = SteamLocalService::new(temp_dir.path());

        assert!(service.installed_games().await.unwrap().is_empty());
        assert_eq!(service.active_account_id().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_active_account_id() {
        let temp_dir = TempDir::new().unwrap();
        write(
            &temp_dir.path().join("config").join("loginusers.vdf"),
            "\"users\"\n{\n\t\"77\"\n\t{\n\t\t\"MostRecent\"\t\t\"1\"\n\t}\n}\n",
        );
        let service = SteamLocalService::new(temp_dir.path());

        assert_eq!(
            service.active_account_id().await.unwrap(),
            Some(AccountId::new("77"))
        );
    }

    #[tokio::test]
    async fn test_removed_login_users_drops_cached_account() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config").join("loginusers.vdf");
        let user = |id: &str| {
            format!("\"users\"\n{{\n\t\"{id}\"\n\t{{\n\t\t\"MostRecent\"\t\t\"1\"\n\t}}\n}}\n")
        };
        write(&path, &user("77"));
        let stamp = modified(&path).unwrap();
        let service = SteamLocalService::new(temp_dir.path());
        assert_eq!(
            service.active_account_id().await.unwrap(),
            Some(AccountId::new("77"))
        );

        fs::remove_file(&path).unwrap();
        assert_eq!(service.active_account_id().await.unwrap(), None);

        // Restored with a different account but the old mtime.
        write(&path, &user("88"));
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(stamp)
            .unwrap();
        assert_eq!(
            service.active_account_id().await.unwrap(),
            Some(AccountId::new("88"))
        );
    }

    #[tokio::test]
    async fn test_commands_fail_without_executable() {
        let temp_dir = TempDir::new().unwrap();
        let service = SteamLocalService::new(temp_dir.path())
            .with_executable(temp_dir.path().join("missing-steam"));

        assert!(!service.launch_title(&TitleId::new("440")).await.unwrap());
        assert!(!service.install_title(&TitleId::new("440")).await.unwrap());
        assert!(!service.uninstall_title(&TitleId::new("440")).await.unwrap());
    }
}
