//! Parsing of Steam's VDF manifests.
//!
//! Steam writes three kinds of files that matter here:
//! - `config/loginusers.vdf` lists known accounts and flags the most recent one
//! - `steamapps/libraryfolders.vdf` lists every library root
//! - `steamapps/appmanifest_<appid>.acf` describes one installed title

use crate::config::SteamConfig;
use crate::error::{FusionError, Result};
use crate::models::{AccountId, InstalledGame, TitleId};
use keyvalues_parser::{Obj, Value, Vdf};
use std::path::{Path, PathBuf};
use tracing::debug;

fn parse_root<'a>(text: &'a str, path: &Path) -> Result<Vdf<'a>> {
    keyvalues_parser::parse(text)
        .map(Vdf::from)
        .map_err(|e| FusionError::manifest(path, e.to_string()))
}

/// Look up a string value, ignoring key case (Steam has written both
/// `MostRecent` and `mostrecent` over the years).
fn get_str<'a>(obj: &'a Obj<'_>, key: &str) -> Option<&'a str> {
    obj.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .and_then(|(_, values)| values.first())
        .and_then(Value::get_str)
}

/// Collapse the doubled backslashes Steam writes into Windows paths.
fn unescape_path(raw: &str) -> PathBuf {
    PathBuf::from(raw.replace("\\\\", "\\"))
}

/// The account flagged `MostRecent "1"` in `loginusers.vdf`, if any.
pub fn parse_login_users(text: &str, path: &Path) -> Result<Option<AccountId>> {
    let vdf = parse_root(text, path)?;
    let users = vdf
        .value
        .get_obj()
        .ok_or_else(|| FusionError::manifest(path, "users is not an object"))?;

    for (steam_id, values) in users.iter() {
        let Some(user) = values.first().and_then(Value::get_obj) else {
            continue;
        };
        if get_str(user, "MostRecent") == Some("1") {
            debug!("Most recent Steam user is {}", steam_id);
            return Ok(Some(AccountId::new(steam_id.to_string())));
        }
    }

    Ok(None)
}

/// Library roots listed in `libraryfolders.vdf`.
///
/// Handles both the current layout (`"0" { "path" "..." }`) and the older one
/// where each numbered key maps straight to a path string.
pub fn parse_library_folders(text: &str, path: &Path) -> Result<Vec<PathBuf>> {
    let vdf = parse_root(text, path)?;
    let folders = vdf
        .value
        .get_obj()
        .ok_or_else(|| FusionError::manifest(path, "libraryfolders is not an object"))?;

    let mut libraries = Vec::new();
    for (key, values) in folders.iter() {
        if key.parse::<u32>().is_err() {
            continue;
        }
        let Some(value) = values.first() else {
            continue;
        };

        let raw = match value {
            Value::Obj(entry) => get_str(entry, "path"),
            Value::Str(raw) => Some(raw.as_ref()),
        };

        match raw.filter(|p| !p.is_empty()) {
            Some(raw) => libraries.push(unescape_path(raw)),
            None => debug!("Library folder {} has no path", key),
        }
    }

    Ok(libraries)
}

/// One installed title from an `appmanifest_*.acf` file.
pub fn parse_app_manifest(text: &str, path: &Path, library: &Path) -> Result<InstalledGame> {
    let vdf = parse_root(text, path)?;
    let state = vdf
        .value
        .get_obj()
        .ok_or_else(|| FusionError::manifest(path, "AppState is not an object"))?;

    let app_id =
        get_str(state, "appid").ok_or_else(|| FusionError::manifest(path, "missing appid"))?;
    let name = get_str(state, "name").ok_or_else(|| FusionError::manifest(path, "missing name"))?;
    let install_dir = get_str(state, "installdir")
        .ok_or_else(|| FusionError::manifest(path, "missing installdir"))?;

    Ok(InstalledGame {
        id: TitleId::new(app_id),
        name: name.to_string(),
        install_directory: library
            .join(SteamConfig::STEAMAPPS_DIR_NAME)
            .join(SteamConfig::COMMON_DIR_NAME)
            .join(install_dir),
        library_path: library.to_path_buf(),
    })
}
