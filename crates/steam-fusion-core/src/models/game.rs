//! Game, account and title identities.

use crate::error::{FusionError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Opaque Steam account identifier (SteamID64 in practice).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque Steam title identifier (app id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TitleId(String);

impl TitleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Composite library identifier of the shape `<accountId>:<titleId>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameId {
    pub account: AccountId,
    pub title: TitleId,
}

impl GameId {
    pub const SEPARATOR: char = ':';

    /// Parse a composite identifier.
    ///
    /// Exactly one separator is allowed and both halves must be non-empty.
    pub fn parse(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split(Self::SEPARATOR).collect();
        if parts.len() != 2 {
            return Err(FusionError::InvalidGameId {
                game_id: raw.to_string(),
                message: "expected <accountId>:<titleId>".into(),
            });
        }

        let (account, title) = (parts[0], parts[1]);
        if account.is_empty() || title.is_empty() {
            return Err(FusionError::InvalidGameId {
                game_id: raw.to_string(),
                message: "account and title ids must not be empty".into(),
            });
        }

        Ok(Self {
            account: AccountId::new(account),
            title: TitleId::new(title),
        })
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.account, Self::SEPARATOR, self.title)
    }
}

/// A library entry as handed over by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameEntry {
    /// Display name, used for logging only.
    pub name: String,
    /// Unparsed composite id; validated when an action starts.
    pub game_id: String,
    pub install_directory: Option<PathBuf>,
}

impl GameEntry {
    pub fn new(name: impl Into<String>, game_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            game_id: game_id.into(),
            install_directory: None,
        }
    }

    pub fn with_install_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_directory = Some(dir.into());
        self
    }

    pub fn parse_id(&self) -> Result<GameId> {
        GameId::parse(&self.game_id)
    }
}

/// A title present in one of the local Steam libraries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledGame {
    pub id: TitleId,
    pub name: String,
    pub install_directory: PathBuf,
    pub library_path: PathBuf,
}
