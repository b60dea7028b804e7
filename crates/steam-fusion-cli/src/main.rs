//! Steam Fusion CLI - drive one library action from the command line.
//!
//! Prints every event the run emits as a JSON line on stdout, so a front end
//! can spawn this binary and read its outcome.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use steam_fusion::switcher::is_newer_version;
use steam_fusion::{
    ActionContext, ChannelSink, GameEntry, InstallController, LibrarySettings, PlayController,
    SwitchGate, SwitcherTool, UninstallController,
};
use tokio::task::JoinHandle;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "steam-fusion")]
#[command(about = "Install, play and uninstall Steam games across accounts")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Settings file (JSON); defaults are used when it does not exist
    #[arg(long, default_value = "settings.json")]
    settings: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Launch a game and wait until it exits
    Play(GameArgs),
    /// Install a game and wait until Steam reports it installed
    Install(GameArgs),
    /// Uninstall a game and wait until Steam no longer lists it
    Uninstall(GameArgs),
    /// Show the account switch tool installation
    Tool {
        /// Directory that holds the portable tool installation
        #[arg(long)]
        root: PathBuf,
        /// Release tag to compare against the installed version
        #[arg(long)]
        latest: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
struct GameArgs {
    /// Library id of the form <accountId>:<titleId>
    game_id: String,

    /// Display name used in logs
    #[arg(long, default_value = "game")]
    name: String,

    /// Install directory used to find the game's process
    #[arg(long)]
    install_dir: Option<PathBuf>,
}

impl GameArgs {
    fn entry(&self) -> GameEntry {
        let entry = GameEntry::new(&self.name, &self.game_id);
        match &self.install_dir {
            Some(dir) => entry.with_install_directory(dir),
            None => entry,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Play,
    Install,
    Uninstall,
}

/// Keeps the controller alive for the duration of the run.
enum Running {
    Play(PlayController),
    Install(InstallController),
    Uninstall(UninstallController),
}

impl Running {
    fn dispose(&self) {
        match self {
            Running::Play(c) => c.dispose(),
            Running::Install(c) => c.dispose(),
            Running::Uninstall(c) => c.dispose(),
        }
    }
}

fn show_tool(root: PathBuf, latest: Option<String>) -> Result<()> {
    let tool = SwitcherTool::new(root);
    let local = tool.local_version()?;

    println!("executable: {}", tool.executable_path().display());
    println!("installed:  {}", tool.is_installed());
    println!("version:    {}", local.as_deref().unwrap_or("unknown"));
    if let Some(latest) = latest {
        let newer = is_newer_version(Some(&latest), local.as_deref());
        println!("update:     {}", if newer { "available" } else { "none" });
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let (action, game) = match args.command {
        Command::Tool { root, latest } => return show_tool(root, latest),
        Command::Play(game) => (Action::Play, game),
        Command::Install(game) => (Action::Install, game),
        Command::Uninstall(game) => (Action::Uninstall, game),
    };

    let settings = LibrarySettings::load(&args.settings)
        .with_context(|| format!("Failed to load settings from {}", args.settings.display()))?;
    let (sink, mut events) = ChannelSink::new();
    let ctx = ActionContext::local(
        settings,
        Arc::new(sink),
        SwitchGate::new(),
        tokio::runtime::Handle::current(),
    )?;

    info!("Starting {:?} for {}", action, game.game_id);
    let (running, mut run): (Running, JoinHandle<()>) = match action {
        Action::Play => {
            let c = PlayController::for_game(game.entry(), ctx);
            let run = c.play()?;
            (Running::Play(c), run)
        }
        Action::Install => {
            let c = InstallController::for_game(game.entry(), ctx);
            let run = c.install()?;
            (Running::Install(c), run)
        }
        Action::Uninstall => {
            let c = UninstallController::for_game(game.entry(), ctx);
            let run = c.uninstall()?;
            (Running::Uninstall(c), run)
        }
    };

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!("Failed to serialize {:?}: {}", event, e),
            }
        }
    });

    tokio::select! {
        result = &mut run => result.context("Run task failed")?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received, cancelling");
            running.dispose();
            run.await.context("Run task failed")?;
        }
    }

    // Dropping the controller releases the context and closes the channel.
    drop(running);
    printer.await.context("Event printer failed")?;

    Ok(())
}
