use super::{ActionContext, ActionController, ActionRun, GameAction};
use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::models::{GameEntry, GameEvent};
use crate::poll::poll_until;
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Request an uninstall and wait until the client no longer lists the title.
///
/// Polls at the slower uninstall cadence. A cancelled uninstall watch reports
/// nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct UninstallAction;

#[async_trait]
impl GameAction for UninstallAction {
    const NAME: &'static str = "uninstall";

    async fn issue(&self, ctx: &ActionContext, run: &ActionRun) -> Result<bool> {
        ctx.client.uninstall_title(&run.id().title).await
    }

    async fn monitor(
        &self,
        ctx: &ActionContext,
        run: &ActionRun,
        token: &CancellationToken,
    ) -> Result<()> {
        let title = &run.id().title;
        info!("Waiting for {} to be removed", run.game().name);

        poll_until(ctx.settings.uninstall_polling_interval(), None, token, || async move {
            ctx.client.install_info(title).await.map(|info| {
                if info.is_some() {
                    debug!("{} still installed", title);
                }
                info.is_none().then_some(())
            })
        })
        .await?;

        run.emit(GameEvent::Uninstalled);
        Ok(())
    }

    fn cancelled_event(&self, _run: &ActionRun) -> Option<GameEvent> {
        None
    }
}

pub type UninstallController = ActionController<UninstallAction>;

impl ActionController<UninstallAction> {
    pub fn for_game(game: GameEntry, ctx: ActionContext) -> Self {
        Self::new(UninstallAction, game, ctx)
    }

    pub fn uninstall(&self) -> Result<JoinHandle<()>> {
        self.start()
    }
}
