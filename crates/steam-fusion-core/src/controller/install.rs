use super::{ActionContext, ActionController, ActionRun, GameAction};
use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::models::{GameEntry, GameEvent};
use crate::poll::poll_until;
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Request an install and wait for the title's manifest to appear.
///
/// There is no overall timeout; only cancellation ends an unfinished install
/// watch, and it still reports `Installed` without a directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstallAction;

#[async_trait]
impl GameAction for InstallAction {
    const NAME: &'static str = "install";

    async fn issue(&self, ctx: &ActionContext, run: &ActionRun) -> Result<bool> {
        ctx.client.install_title(&run.id().title).await
    }

    async fn monitor(
        &self,
        ctx: &ActionContext,
        run: &ActionRun,
        token: &CancellationToken,
    ) -> Result<()> {
        let title = &run.id().title;
        info!("Waiting for {} to finish installing", run.game().name);

        let installed = poll_until(ctx.settings.polling_interval(), None, token, || async move {
            ctx.client.install_info(title).await.inspect(|info| {
                if info.is_none() {
                    debug!("{} not installed yet", title);
                }
            })
        })
        .await?;

        run.emit(GameEvent::Installed {
            install_directory: installed.map(|game| game.install_directory),
        });
        Ok(())
    }

    fn cancelled_event(&self, _run: &ActionRun) -> Option<GameEvent> {
        Some(GameEvent::Installed {
            install_directory: None,
        })
    }
}

pub type InstallController = ActionController<InstallAction>;

impl ActionController<InstallAction> {
    pub fn for_game(game: GameEntry, ctx: ActionContext) -> Self {
        Self::new(InstallAction, game, ctx)
    }

    /// Start installing. Returns immediately; the outcome arrives as an event.
    pub fn install(&self) -> Result<JoinHandle<()>> {
        self.start()
    }
}
