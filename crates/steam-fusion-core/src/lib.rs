//! Steam Fusion - Headless orchestration of Steam actions across accounts.
//!
//! A library host (a game launcher front end, the bundled CLI) hands over a
//! library entry whose id has the shape `<accountId>:<titleId>`. The crate
//! signs Steam into the owning account through an external switch tool,
//! issues the install, uninstall or launch command, and watches the client
//! and the process table until the outcome is known. Outcomes are reported
//! only as [`GameEvent`]s.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use steam_fusion::{
//!     ActionContext, ChannelSink, GameEntry, LibrarySettings, PlayController, SwitchGate,
//! };
//!
//! #[tokio::main]
//! async fn main() -> steam_fusion::Result<()> {
//!     let settings = LibrarySettings::load("settings.json")?;
//!     let (sink, mut events) = ChannelSink::new();
//!     let ctx = ActionContext::local(
//!         settings,
//!         Arc::new(sink),
//!         SwitchGate::new(),
//!         tokio::runtime::Handle::current(),
//!     )?;
//!
//!     let game = GameEntry::new("Team Fortress 2", "76561198000000001:440");
//!     let controller = PlayController::for_game(game, ctx);
//!     controller.play()?;
//!
//!     while let Some(event) = events.recv().await {
//!         println!("{event:?}");
//!         if event.is_terminal() {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod platform;
pub mod poll;
pub mod process;
pub mod switcher;

// Re-export commonly used types
pub use cancel::{CancellationToken, CancelledError};
pub use client::{GameClientService, ModifiedCache, SteamLocalService};
pub use config::{LibrarySettings, PollingPolicy};
pub use controller::{
    run_action, ActionContext, ActionController, ActionRun, GameAction, InstallAction,
    InstallController, PlayAction, PlayController, UninstallAction, UninstallController,
};
pub use error::{FusionError, Result};
pub use models::{
    AccountId, ChannelSink, EventSink, GameEntry, GameEvent, GameId, InstalledGame,
    RecordingSink, TitleId,
};
pub use poll::poll_until;
pub use process::{
    MatchPolicy, ProcessMatcher, ProcessProbe, ProcessTable, ProcessWatcher, SystemProcessTable,
    TargetDirectory, ToolRunner,
};
pub use switcher::{AccountSwitch, AccountSwitcher, SwitchGate, SwitcherTool};
