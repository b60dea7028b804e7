//! The game client seam.
//!
//! Controllers and the account switcher only talk to Steam through
//! [`GameClientService`]. [`SteamLocalService`] is the production
//! implementation; tests substitute scripted fakes.

mod cache;
mod local;
pub mod manifest;

pub use cache::ModifiedCache;
pub use local::SteamLocalService;

use crate::error::Result;
use crate::models::{AccountId, InstalledGame, TitleId};
use async_trait::async_trait;

/// Queries and commands against the local game client.
///
/// Command methods only report whether the request was handed to the client;
/// they never wait for it to take effect.
#[async_trait]
pub trait GameClientService: Send + Sync {
    /// Every title installed across all libraries.
    async fn installed_games(&self) -> Result<Vec<InstalledGame>>;

    /// The account the client is currently signed into.
    async fn active_account_id(&self) -> Result<Option<AccountId>>;

    async fn launch_title(&self, title: &TitleId) -> Result<bool>;

    async fn install_title(&self, title: &TitleId) -> Result<bool>;

    async fn uninstall_title(&self, title: &TitleId) -> Result<bool>;

    /// Install details for one title, `None` while it is not installed.
    async fn install_info(&self, title: &TitleId) -> Result<Option<InstalledGame>>;
}
