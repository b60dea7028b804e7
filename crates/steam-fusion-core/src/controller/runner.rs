//! The shared run sequence and the controller that owns it.

use super::{ActionContext, GameAction};
use crate::cancel::CancellationToken;
use crate::error::{FusionError, Result};
use crate::models::{EventSink, GameEntry, GameEvent, GameId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

struct RunState {
    game: GameEntry,
    id: GameId,
    events: Arc<dyn EventSink>,
    started_at: Mutex<Option<Instant>>,
    finished: AtomicBool,
}

/// One execution of an action for one game.
///
/// Cheap to clone; clones share the stopwatch and the terminal flag, so a run
/// emits at most one terminal event no matter who reports it.
#[derive(Clone)]
pub struct ActionRun {
    state: Arc<RunState>,
}

impl ActionRun {
    pub fn new(game: GameEntry, id: GameId, events: Arc<dyn EventSink>) -> Self {
        Self {
            state: Arc::new(RunState {
                game,
                id,
                events,
                started_at: Mutex::new(None),
                finished: AtomicBool::new(false),
            }),
        }
    }

    pub fn game(&self) -> &GameEntry {
        &self.state.game
    }

    pub fn id(&self) -> &GameId {
        &self.state.id
    }

    /// Forward `event` to the host.
    ///
    /// `Started` also starts the run's stopwatch. Terminal events after the
    /// first are dropped.
    pub fn emit(&self, event: GameEvent) {
        if event.is_terminal() {
            if self.state.finished.swap(true, Ordering::SeqCst) {
                warn!(
                    "Dropping {:?} for {}: run already finished",
                    event, self.state.game.name
                );
                return;
            }
        } else if let Ok(mut started_at) = self.state.started_at.lock() {
            started_at.get_or_insert_with(Instant::now);
        }

        info!("{}: {:?}", self.state.game.name, event);
        self.state.events.emit(event);
    }

    /// Whole seconds since `Started`, or zero if the game never started.
    pub fn elapsed_secs(&self) -> u64 {
        self.state
            .started_at
            .lock()
            .ok()
            .and_then(|started_at| *started_at)
            .map(|started_at| started_at.elapsed().as_secs_f64().round() as u64)
            .unwrap_or(0)
    }

    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::SeqCst)
    }
}

async fn drive<A: GameAction>(
    action: &A,
    ctx: &ActionContext,
    run: &ActionRun,
    token: &CancellationToken,
) -> Result<bool> {
    let account = &run.id().account;

    info!("{}: switching to account {}", A::NAME, account);
    if !ctx.switcher.switch_to_account(account, token).await? {
        warn!("{}: could not switch to account {}", A::NAME, account);
        return Ok(false);
    }

    token.check()?;
    if !action.issue(ctx, run).await? {
        warn!("{}: client rejected command for {}", A::NAME, run.id());
        return Ok(false);
    }

    action.monitor(ctx, run, token).await?;
    Ok(true)
}

/// Execute one run of `action` and make sure the host hears how it ended.
pub async fn run_action<A: GameAction>(
    action: &A,
    ctx: &ActionContext,
    run: &ActionRun,
    token: &CancellationToken,
) {
    let outcome = drive(action, ctx, run, token).await;

    let event = match outcome {
        Ok(true) => {
            debug!("{} for {} completed", A::NAME, run.game().name);
            return;
        }
        Ok(false) => action.failure_event(run),
        Err(e) if e.is_cancelled() => {
            info!("{} for {} was cancelled", A::NAME, run.game().name);
            action.cancelled_event(run)
        }
        Err(e) => {
            error!("{} for {} failed: {}", A::NAME, run.game().name, e);
            action.failure_event(run)
        }
    };

    if let Some(event) = event {
        run.emit(event);
    }
}

/// Owns one action for one game and the cancellation token of its run.
///
/// Dropping the controller cancels the run.
pub struct ActionController<A: GameAction> {
    action: Arc<A>,
    game: GameEntry,
    ctx: ActionContext,
    token: CancellationToken,
    launched: AtomicBool,
}

impl<A: GameAction> ActionController<A> {
    pub fn new(action: A, game: GameEntry, ctx: ActionContext) -> Self {
        Self {
            action: Arc::new(action),
            game,
            ctx,
            token: CancellationToken::new(),
            launched: AtomicBool::new(false),
        }
    }

    pub fn game(&self) -> &GameEntry {
        &self.game
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Validate the game id and spawn the run.
    ///
    /// A malformed id is returned here and no event is ever emitted for it.
    /// A controller runs at most once.
    pub fn start(&self) -> Result<JoinHandle<()>> {
        let id = self.game.parse_id()?;

        if self.launched.swap(true, Ordering::SeqCst) {
            return Err(FusionError::AlreadyStarted {
                game: self.game.name.clone(),
            });
        }

        info!("Starting {} for {} ({})", A::NAME, self.game.name, id);
        let run = ActionRun::new(self.game.clone(), id, self.ctx.events.clone());
        let supervised = supervise(
            self.action.clone(),
            self.ctx.clone(),
            run,
            self.token.clone(),
        );
        Ok(self.ctx.runtime.spawn(supervised))
    }

    /// Cancel the run. Safe to call any number of times, before, during or
    /// after the run.
    pub fn dispose(&self) {
        if self.token.cancel() {
            debug!("Cancelled {} for {}", A::NAME, self.game.name);
        }
    }
}

impl<A: GameAction> Drop for ActionController<A> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Run the action on its own task so a panic still produces a terminal event.
async fn supervise<A: GameAction>(
    action: Arc<A>,
    ctx: ActionContext,
    run: ActionRun,
    token: CancellationToken,
) {
    let worker = {
        let action = action.clone();
        let run = run.clone();
        let runtime = ctx.runtime.clone();
        runtime.spawn(async move {
            run_action(action.as_ref(), &ctx, &run, &token).await;
        })
    };

    if let Err(e) = worker.await {
        error!("{} for {} aborted: {}", A::NAME, run.game().name, e);
        if !run.is_finished() {
            if let Some(event) = action.failure_event(&run) {
                run.emit(event);
            }
        }
    }
}
