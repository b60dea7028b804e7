//! Scripted stand-ins for the Steam client, the switcher and the process table.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use steam_fusion::process::ProcessEntry;
use steam_fusion::{
    AccountId, AccountSwitch, ActionContext, CancellationToken, FusionError, GameClientService,
    InstalledGame, LibrarySettings, ProcessTable, RecordingSink, Result, TitleId,
};
use tokio::time::Instant;

pub const GAME_DIR: &str = "/games/tf2";

pub fn secs(s: f64) -> Duration {
    Duration::from_secs_f64(s)
}

pub fn settings() -> LibrarySettings {
    LibrarySettings {
        launcher_location: Some(PathBuf::from("/tools/TcNo-Acc-Switcher.exe")),
        polling_interval_ms: 100,
        switch_timeout_secs: 5,
        launch_timeout_secs: 5,
        ..LibrarySettings::default()
    }
}

/// When the title counts as installed, relative to client creation.
#[derive(Debug, Clone, Copy)]
pub enum Presence {
    Never,
    Always,
    From(Duration),
    Until(Duration),
}

impl Presence {
    fn at(self, elapsed: Duration) -> bool {
        match self {
            Presence::Never => false,
            Presence::Always => true,
            Presence::From(from) => elapsed >= from,
            Presence::Until(until) => elapsed < until,
        }
    }
}

pub struct FakeClient {
    origin: Instant,
    pub installed: Presence,
    pub accept_commands: bool,
    pub fail_install_info: bool,
    pub launches: AtomicUsize,
    pub installs: AtomicUsize,
    pub uninstalls: AtomicUsize,
}

impl FakeClient {
    pub fn new(installed: Presence) -> Self {
        Self {
            origin: Instant::now(),
            installed,
            accept_commands: true,
            fail_install_info: false,
            launches: AtomicUsize::new(0),
            installs: AtomicUsize::new(0),
            uninstalls: AtomicUsize::new(0),
        }
    }

    fn game(&self, title: &TitleId) -> InstalledGame {
        InstalledGame {
            id: title.clone(),
            name: "Team Fortress 2".into(),
            install_directory: PathBuf::from(GAME_DIR),
            library_path: PathBuf::from("/games"),
        }
    }
}

#[async_trait]
impl GameClientService for FakeClient {
    async fn installed_games(&self) -> Result<Vec<InstalledGame>> {
        let title = TitleId::new("440");
        Ok(self
            .installed
            .at(self.origin.elapsed())
            .then(|| self.game(&title))
            .into_iter()
            .collect())
    }

    async fn active_account_id(&self) -> Result<Option<AccountId>> {
        Ok(Some(AccountId::new("77")))
    }

    async fn launch_title(&self, _title: &TitleId) -> Result<bool> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(self.accept_commands)
    }

    async fn install_title(&self, _title: &TitleId) -> Result<bool> {
        self.installs.fetch_add(1, Ordering::SeqCst);
        Ok(self.accept_commands)
    }

    async fn uninstall_title(&self, _title: &TitleId) -> Result<bool> {
        self.uninstalls.fetch_add(1, Ordering::SeqCst);
        Ok(self.accept_commands)
    }

    async fn install_info(&self, title: &TitleId) -> Result<Option<InstalledGame>> {
        if self.fail_install_info {
            return Err(FusionError::Other("client went away".into()));
        }
        Ok(self
            .installed
            .at(self.origin.elapsed())
            .then(|| self.game(title)))
    }
}

pub struct FakeSwitcher {
    pub succeed: bool,
    pub calls: AtomicUsize,
}

impl FakeSwitcher {
    pub fn new(succeed: bool) -> Self {
        Self {
            succeed,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AccountSwitch for FakeSwitcher {
    async fn switch_to_account(
        &self,
        _account: &AccountId,
        token: &CancellationToken,
    ) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        token.check()?;
        Ok(self.succeed)
    }
}

/// Reports the game process during the given windows.
pub struct FakeProcesses {
    origin: Instant,
    running: Vec<(Duration, Duration)>,
}

impl FakeProcesses {
    pub fn new(running: Vec<(Duration, Duration)>) -> Self {
        Self {
            origin: Instant::now(),
            running,
        }
    }
}

impl ProcessTable for FakeProcesses {
    fn snapshot(&self) -> Vec<ProcessEntry> {
        let now = self.origin.elapsed();
        let mut processes = vec![ProcessEntry {
            pid: 1,
            name: "init".into(),
            exe: None,
        }];
        if self
            .running
            .iter()
            .any(|(from, to)| now >= *from && now < *to)
        {
            processes.push(ProcessEntry {
                pid: 1234,
                name: "hl2.exe".into(),
                exe: Some(PathBuf::from(GAME_DIR).join("hl2.exe")),
            });
        }
        processes
    }
}

pub struct Harness {
    pub client: Arc<FakeClient>,
    pub switcher: Arc<FakeSwitcher>,
    pub events: Arc<RecordingSink>,
    pub ctx: ActionContext,
}

pub fn harness(client: FakeClient, switcher: FakeSwitcher, processes: FakeProcesses) -> Harness {
    let client = Arc::new(client);
    let switcher = Arc::new(switcher);
    let events = Arc::new(RecordingSink::new());
    let ctx = ActionContext {
        settings: settings(),
        client: client.clone(),
        switcher: switcher.clone(),
        processes: Arc::new(processes),
        events: events.clone(),
        runtime: tokio::runtime::Handle::current(),
    };
    Harness {
        client,
        switcher,
        events,
        ctx,
    }
}
