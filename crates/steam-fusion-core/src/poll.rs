//! Cooperative "sleep then re-check" polling.
//!
//! Every wait in the crate (process start/end, account switch, client
//! readiness, install and uninstall monitoring) goes through [`poll_until`].

use crate::cancel::CancellationToken;
use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Probe repeatedly until it yields a value, the timeout elapses, or the token
/// is cancelled.
///
/// The probe runs immediately, then once per `interval`. Returns:
/// - `Ok(Some(value))` as soon as the probe yields a value
/// - `Ok(None)` after a failed probe once `timeout` has elapsed (never when
///   `timeout` is `None`)
/// - `Err(FusionError::Cancelled)` if the token is cancelled before or during
///   a sleep
///
/// Probe errors are propagated unchanged.
pub async fn poll_until<T, F, Fut>(
    interval: Duration,
    timeout: Option<Duration>,
    token: &CancellationToken,
    mut probe: F,
) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let started = Instant::now();
    let mut attempts: u64 = 0;

    loop {
        token.check()?;

        attempts += 1;
        if let Some(value) = probe().await? {
            trace!(
                "poll_until satisfied after {} attempts ({:?})",
                attempts,
                started.elapsed()
            );
            return Ok(Some(value));
        }

        if let Some(timeout) = timeout {
            if started.elapsed() >= timeout {
                trace!("poll_until timed out after {} attempts", attempts);
                return Ok(None);
            }
        }

        token.sleep(interval).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FusionError;

    const INTERVAL: Duration = Duration::from_millis(100);

    #[tokio::test(start_paused = true)]
    async fn test_returns_value_when_probe_succeeds() {
        let token = CancellationToken::new();
        let mut calls = 0;

        let result = poll_until(INTERVAL, Some(Duration::from_secs(5)), &token, || {
            calls += 1;
            let value = (calls == 3).then_some(calls);
            async move { Ok(value) }
        })
        .await
        .unwrap();

        assert_eq!(result, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_with_none() {
        let token = CancellationToken::new();
        let started = Instant::now();

        let result: Option<()> = poll_until(INTERVAL, Some(Duration::from_secs(1)), &token, || {
            async { Ok(None) }
        })
        .await
        .unwrap();

        assert_eq!(result, None);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed <= Duration::from_secs(1) + INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_is_not_a_timeout() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            canceller.cancel();
        });

        let result: Result<Option<()>> =
            poll_until(INTERVAL, None, &token, || async { Ok(None) }).await;

        assert!(matches!(result, Err(FusionError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_error_propagates() {
        let token = CancellationToken::new();

        let result: Result<Option<()>> = poll_until(INTERVAL, None, &token, || async {
            Err(FusionError::Other("probe failed".into()))
        })
        .await;

        assert!(matches!(result, Err(FusionError::Other(_))));
    }

    #[tokio::test]
    async fn test_already_cancelled_skips_probe() {
        let token = CancellationToken::new();
        token.cancel();
        let mut calls = 0;

        let result: Result<Option<()>> = poll_until(INTERVAL, None, &token, || {
            calls += 1;
            async { Ok(None) }
        })
        .await;

        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(calls, 0);
    }
}
