//! Switching the signed-in Steam account.

use super::tool::switch_arguments;
use crate::cancel::CancellationToken;
use crate::client::GameClientService;
use crate::config::{LibrarySettings, SteamConfig};
use crate::error::{FusionError, Result};
use crate::models::AccountId;
use crate::poll::poll_until;
use crate::process::{is_running_by_name, ProcessTable, ToolRunner};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Serializes account switches across runs.
///
/// Two runs that share a gate never drive the switch tool at the same time.
#[derive(Debug, Clone, Default)]
pub struct SwitchGate {
    inner: Arc<Mutex<()>>,
}

impl SwitchGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the gate, giving up if the token is cancelled first.
    pub async fn acquire(&self, token: &CancellationToken) -> Result<MutexGuard<'_, ()>> {
        tokio::select! {
            guard = self.inner.lock() => Ok(guard),
            _ = token.cancelled() => Err(FusionError::Cancelled),
        }
    }
}

/// Something that can make a given account the active one.
#[async_trait]
pub trait AccountSwitch: Send + Sync {
    /// Returns `Ok(true)` once `account` is active and the client is running,
    /// `Ok(false)` on timeouts and tool failures, and `Err(Cancelled)` when
    /// the token fires.
    async fn switch_to_account(
        &self,
        account: &AccountId,
        token: &CancellationToken,
    ) -> Result<bool>;
}

/// Drives the external switch tool and waits for Steam to settle.
pub struct AccountSwitcher {
    settings: LibrarySettings,
    client: Arc<dyn GameClientService>,
    tools: Arc<dyn ToolRunner>,
    processes: Arc<dyn ProcessTable>,
    gate: SwitchGate,
}

impl AccountSwitcher {
    pub fn new(
        settings: LibrarySettings,
        client: Arc<dyn GameClientService>,
        tools: Arc<dyn ToolRunner>,
        processes: Arc<dyn ProcessTable>,
    ) -> Self {
        Self {
            settings,
            client,
            tools,
            processes,
            gate: SwitchGate::new(),
        }
    }

    /// Share a gate with other switchers.
    pub fn with_gate(mut self, gate: SwitchGate) -> Self {
        self.gate = gate;
        self
    }

    /// Run the switch tool; `false` when it is not configured or cannot start.
    async fn run_tool(&self, account: &AccountId, token: &CancellationToken) -> Result<bool> {
        let Some(launcher) = self.settings.launcher_location.as_deref() else {
            error!("{}", FusionError::SwitchToolNotConfigured);
            return Ok(false);
        };

        debug!("Switching Steam account to {}", account);
        match self
            .tools
            .run_to_exit(launcher, &switch_arguments(account), token)
            .await
        {
            Ok(()) => {
                info!("Switch tool finished for account {}", account);
                Ok(true)
            }
            Err(FusionError::Cancelled) => {
                warn!("Waiting for the account switch tool was cancelled");
                Err(FusionError::Cancelled)
            }
            Err(e) => {
                error!("Account switch tool failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn wait_for_account(&self, account: &AccountId, token: &CancellationToken) -> Result<bool> {
        debug!("Waiting for Steam user switch...");
        let started = Instant::now();

        let switched = poll_until(
            self.settings.polling_interval(),
            Some(self.settings.switch_timeout()),
            token,
            || async move {
                self.client.active_account_id().await.map(|active| {
                    if active.as_ref() == Some(account) {
                        return Some(());
                    }
                    debug!(
                        "Active Steam user is {:?}, waiting for {}...",
                        active.as_ref().map(AccountId::as_str),
                        account
                    );
                    None
                })
            },
        )
        .await?;

        match switched {
            Some(()) => {
                info!(
                    "Steam user switched to {} after {:.1} seconds",
                    account,
                    started.elapsed().as_secs_f64()
                );
                Ok(true)
            }
            None => {
                warn!("Timeout waiting for Steam account switch");
                Ok(false)
            }
        }
    }

    async fn wait_for_client(&self, token: &CancellationToken) -> Result<bool> {
        debug!("Waiting for Steam to start...");
        let started = Instant::now();

        let running = poll_until(
            self.settings.polling_interval(),
            Some(self.settings.launch_timeout()),
            token,
            || {
                let running =
                    is_running_by_name(self.processes.as_ref(), SteamConfig::CLIENT_PROCESS_NAME);
                if !running {
                    debug!("Steam process not started, waiting...");
                }
                async move { Ok(running.then_some(())) }
            },
        )
        .await?;

        match running {
            Some(()) => {
                info!(
                    "Steam is running after {:.1} seconds",
                    started.elapsed().as_secs_f64()
                );
                Ok(true)
            }
            None => {
                warn!("Timeout waiting for Steam to start");
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl AccountSwitch for AccountSwitcher {
    async fn switch_to_account(
        &self,
        account: &AccountId,
        token: &CancellationToken,
    ) -> Result<bool> {
        let _guard = self.gate.acquire(token).await?;

        if self.client.active_account_id().await?.as_ref() == Some(account) {
            info!("Active Steam user is {}, no switching needed", account);
            return self.wait_for_client(token).await;
        }

        if !self.run_tool(account, token).await? {
            return Ok(false);
        }

        if !self.wait_for_account(account, token).await? {
            return Ok(false);
        }

        self.wait_for_client(token).await
    }
}
