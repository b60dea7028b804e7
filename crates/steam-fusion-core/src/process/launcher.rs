//! Child process launching for external helper tools.

use crate::cancel::CancellationToken;
use crate::error::{FusionError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

/// Windows process creation flag that suppresses the console window.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Runs a helper program until it exits.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Start `program` and wait for it to exit.
    ///
    /// Exit status is not inspected; exiting at all counts as success. On
    /// cancellation the child is killed (best-effort) and `Err(Cancelled)` is
    /// returned. A program that cannot be started is `Err(LaunchFailed)`.
    async fn run_to_exit(
        &self,
        program: &Path,
        args: &[String],
        token: &CancellationToken,
    ) -> Result<()>;
}

/// [`ToolRunner`] backed by `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandToolRunner;

#[async_trait]
impl ToolRunner for CommandToolRunner {
    async fn run_to_exit(
        &self,
        program: &Path,
        args: &[String],
        token: &CancellationToken,
    ) -> Result<()> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        let mut child = cmd.spawn().map_err(|e| FusionError::LaunchFailed {
            program: program.to_path_buf(),
            message: e.to_string(),
            source: Some(e),
        })?;

        debug!(
            "Started {} (pid {:?}), waiting for exit",
            program.display(),
            child.id()
        );

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|e| FusionError::io_with_path(e, program))?;
                info!("{} exited with {}", program.display(), status);
                Ok(())
            }
            _ = token.cancelled() => {
                warn!("Cancelled while waiting for {}, killing it", program.display());
                if let Err(e) = child.start_kill() {
                    // The run is already unwinding; a failed kill changes nothing.
                    warn!("Failed to kill {}: {}", program.display(), e);
                }
                Err(FusionError::Cancelled)
            }
        }
    }
}

/// Start `program` without waiting for it.
///
/// Used for fire-and-forget client commands such as `steam://` URIs. The
/// child handle is dropped straight away; tokio reaps it once it exits. Must
/// be called from within a tokio runtime.
pub fn spawn_detached(program: &Path, args: &[String]) -> Result<()> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);

    match cmd.spawn() {
        Ok(child) => {
            debug!(
                "Spawned {} {:?} (pid {:?})",
                program.display(),
                args,
                child.id()
            );
            Ok(())
        }
        Err(e) => {
            error!("Failed to spawn {}: {}", program.display(), e);
            Err(FusionError::LaunchFailed {
                program: PathBuf::from(program),
                message: e.to_string(),
                source: Some(e),
            })
        }
    }
}
