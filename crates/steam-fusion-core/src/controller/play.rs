use super::{ActionContext, ActionController, ActionRun, GameAction};
use crate::cancel::CancellationToken;
use crate::error::{FusionError, Result};
use crate::models::{GameEntry, GameEvent};
use crate::process::{MatchPolicy, ProcessMatcher, ProcessWatcher, TargetDirectory};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Launch a title and follow its process until it has stayed gone.
///
/// The game is located by install directory: the one on the library entry,
/// or the client's install info when the entry has none.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlayAction {
    policy: MatchPolicy,
}

impl PlayAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also accept executables in subdirectories of the install directory.
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn install_directory(&self, ctx: &ActionContext, run: &ActionRun) -> Result<PathBuf> {
        if let Some(dir) = &run.game().install_directory {
            return Ok(dir.clone());
        }

        ctx.client
            .install_info(&run.id().title)
            .await?
            .map(|game| game.install_directory)
            .ok_or_else(|| FusionError::MissingInstallDirectory {
                game: run.game().name.clone(),
            })
    }
}

#[async_trait]
impl GameAction for PlayAction {
    const NAME: &'static str = "play";

    async fn issue(&self, ctx: &ActionContext, run: &ActionRun) -> Result<bool> {
        ctx.client.launch_title(&run.id().title).await
    }

    async fn monitor(
        &self,
        ctx: &ActionContext,
        run: &ActionRun,
        token: &CancellationToken,
    ) -> Result<()> {
        let target = TargetDirectory::new(self.install_directory(ctx, run).await?)?;
        info!(
            "Watching for {} in {}",
            run.game().name,
            target.path().display()
        );

        let matcher = ProcessMatcher::new(target, ctx.processes.clone()).with_policy(self.policy);
        let watcher = ProcessWatcher::new(matcher, ctx.settings.game_polling_policy());

        let Some(pid) = watcher.wait_for_start(token).await? else {
            warn!("{} did not start", run.game().name);
            run.emit(GameEvent::Stopped { elapsed_secs: 0 });
            return Ok(());
        };

        info!("{} is running as process {}", run.game().name, pid);
        run.emit(GameEvent::Started);

        watcher.wait_for_end(token).await?;
        run.emit(GameEvent::Stopped {
            elapsed_secs: run.elapsed_secs(),
        });
        Ok(())
    }

    fn cancelled_event(&self, run: &ActionRun) -> Option<GameEvent> {
        self.failure_event(run)
    }
}

pub type PlayController = ActionController<PlayAction>;

impl ActionController<PlayAction> {
    pub fn for_game(game: GameEntry, ctx: ActionContext) -> Self {
        Self::new(PlayAction::new(), game, ctx)
    }

    /// Start playing. `Started` and `Stopped` arrive as events.
    pub fn play(&self) -> Result<JoinHandle<()>> {
        self.start()
    }
}
