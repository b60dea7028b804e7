//! Awaitable process start/end detection.

use super::detection::ProcessProbe;
use crate::cancel::CancellationToken;
use crate::config::PollingPolicy;
use crate::error::Result;
use crate::poll::poll_until;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Watches for a process to appear and, later, to stay gone.
pub struct ProcessWatcher<P: ProcessProbe> {
    probe: P,
    policy: PollingPolicy,
}

impl<P: ProcessProbe> ProcessWatcher<P> {
    pub fn new(probe: P, policy: PollingPolicy) -> Self {
        Self { probe, policy }
    }

    pub fn policy(&self) -> &PollingPolicy {
        &self.policy
    }

    /// Wait until a matching process appears.
    ///
    /// Returns the process id, or `None` once `start_timeout` has elapsed
    /// without a match. Cancellation is reported as `Err(Cancelled)`.
    pub async fn wait_for_start(&self, token: &CancellationToken) -> Result<Option<u32>> {
        info!(
            "Watching for process start (timeout {:?})",
            self.policy.start_timeout
        );

        let found = poll_until(
            self.policy.polling_interval,
            Some(self.policy.start_timeout),
            token,
            || {
                let pid = self.probe.find_matching_process().map(|p| p.pid);
                async move { Ok(pid) }
            },
        )
        .await?;

        match found {
            Some(pid) => info!("Found target process {}", pid),
            None => warn!(
                "Process watch timed out after {:?}",
                self.policy.start_timeout
            ),
        }

        Ok(found)
    }

    /// Wait until no matching process has been seen for the stabilization
    /// window.
    ///
    /// The window is measured from the last tick that observed a match, so a
    /// process that exits and relaunches itself inside the window keeps the
    /// wait alive. There is no overall timeout.
    pub async fn wait_for_end(&self, token: &CancellationToken) -> Result<()> {
        info!(
            "Watching for process termination (stabilization window {:?})",
            self.policy.stabilization_window
        );

        let window = self.policy.stabilization_window;
        let mut last_seen = Instant::now();
        let mut missing = false;

        poll_until(self.policy.polling_interval, None, token, || {
            let ended = match self.probe.find_matching_process() {
                Some(process) => {
                    if missing {
                        debug!(
                            "Process {} found again, resetting stabilization window",
                            process.pid
                        );
                        missing = false;
                    }
                    last_seen = Instant::now();
                    None
                }
                None => {
                    missing = true;
                    let absent_for = last_seen.elapsed();
                    debug!("No process for {:?} (window {:?})", absent_for, window);
                    (absent_for >= window).then_some(())
                }
            };
            async move { Ok(ended) }
        })
        .await?;

        info!("Process stayed gone through the stabilization window");
        Ok(())
    }
}
