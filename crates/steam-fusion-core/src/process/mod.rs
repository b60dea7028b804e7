//! Process discovery, watching and helper launching.
//!
//! # Detection Strategy
//!
//! Game processes are recognised by where their executable lives, not by
//! name: every scan walks the whole process table, resolves each executable
//! path best-effort, and compares its directory with the game's install
//! directory. Nothing is cached between scans because launchers routinely
//! spawn renamed children and exit.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use steam_fusion::cancel::CancellationToken;
//! use steam_fusion::config::LibrarySettings;
//! use steam_fusion::process::{ProcessMatcher, ProcessWatcher, SystemProcessTable, TargetDirectory};
//!
//! # async fn run() -> steam_fusion::Result<()> {
//! let target = TargetDirectory::new("C:/Games/Steam/steamapps/common/Portal")?;
//! let matcher = ProcessMatcher::new(target, Arc::new(SystemProcessTable::new()));
//! let watcher = ProcessWatcher::new(matcher, LibrarySettings::default().game_polling_policy());
//!
//! let token = CancellationToken::new();
//! if let Some(pid) = watcher.wait_for_start(&token).await? {
//!     println!("Portal is running as {pid}");
//!     watcher.wait_for_end(&token).await?;
//! }
//! # Ok(())
//! # }
//! ```

mod detection;
mod launcher;
mod watcher;

pub use detection::{
    is_running_by_name, MatchPolicy, ProcessEntry, ProcessHandle, ProcessMatcher, ProcessProbe,
    ProcessTable, SystemProcessTable, TargetDirectory,
};
pub use launcher::{spawn_detached, CommandToolRunner, ToolRunner};
pub use watcher::ProcessWatcher;
