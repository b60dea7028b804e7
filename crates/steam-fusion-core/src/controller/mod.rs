//! Install, uninstall and play controllers.
//!
//! Every action follows the same sequence: validate the composite game id,
//! switch to the owning account, issue one client command, then monitor the
//! client or the game process until the outcome is known. [`run_action`]
//! implements that sequence once; each action only supplies its command, its
//! monitoring step and its terminal events through [`GameAction`].
//!
//! Runs are fire-and-forget. Entry methods validate synchronously, spawn the
//! run and return immediately; the host learns how a run ended only from the
//! [`GameEvent`](crate::models::GameEvent)s it emits.

mod install;
mod play;
mod runner;
mod uninstall;

pub use install::{InstallAction, InstallController};
pub use play::{PlayAction, PlayController};
pub use runner::{run_action, ActionController, ActionRun};
pub use uninstall::{UninstallAction, UninstallController};

use crate::cancel::CancellationToken;
use crate::client::{GameClientService, SteamLocalService};
use crate::config::LibrarySettings;
use crate::error::Result;
use crate::models::{EventSink, GameEvent};
use crate::process::{CommandToolRunner, ProcessTable, SystemProcessTable};
use crate::switcher::{AccountSwitch, AccountSwitcher, SwitchGate};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Services and settings shared by every run a controller starts.
#[derive(Clone)]
pub struct ActionContext {
    pub settings: LibrarySettings,
    pub client: Arc<dyn GameClientService>,
    pub switcher: Arc<dyn AccountSwitch>,
    pub processes: Arc<dyn ProcessTable>,
    pub events: Arc<dyn EventSink>,
    /// Runtime that background runs are spawned onto.
    pub runtime: Handle,
}

impl ActionContext {
    /// Wire up the production services for `settings`.
    ///
    /// All switchers built from one `gate` serialize their account switches.
    pub fn local(
        settings: LibrarySettings,
        events: Arc<dyn EventSink>,
        gate: SwitchGate,
        runtime: Handle,
    ) -> Result<Self> {
        settings.validate()?;

        let client: Arc<dyn GameClientService> = Arc::new(SteamLocalService::from_settings(&settings)?);
        let processes: Arc<dyn ProcessTable> = Arc::new(SystemProcessTable::new());
        let switcher = AccountSwitcher::new(
            settings.clone(),
            client.clone(),
            Arc::new(CommandToolRunner),
            processes.clone(),
        )
        .with_gate(gate);

        Ok(Self {
            settings,
            client,
            switcher: Arc::new(switcher),
            processes,
            events,
            runtime,
        })
    }
}

/// The parts of a run that differ between install, uninstall and play.
#[async_trait]
pub trait GameAction: Send + Sync + 'static {
    /// Short name used in log lines.
    const NAME: &'static str;

    /// Hand the action's command to the client. `Ok(false)` ends the run as a
    /// failure.
    async fn issue(&self, ctx: &ActionContext, run: &ActionRun) -> Result<bool>;

    /// Wait for the command to take effect and emit the outcome.
    async fn monitor(
        &self,
        ctx: &ActionContext,
        run: &ActionRun,
        token: &CancellationToken,
    ) -> Result<()>;

    /// Event for a failed switch, a rejected command or a fault.
    fn failure_event(&self, run: &ActionRun) -> Option<GameEvent> {
        Some(GameEvent::Stopped {
            elapsed_secs: run.elapsed_secs(),
        })
    }

    /// Event for a run abandoned through cancellation.
    fn cancelled_event(&self, run: &ActionRun) -> Option<GameEvent>;
}
