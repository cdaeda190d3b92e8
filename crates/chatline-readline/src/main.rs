use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use chatline_application::SyncController;
use chatline_core::config::BackendFlavor;
use chatline_core::session::{MemorySelectionRepository, SelectionRepository, SessionStore};
use chatline_infrastructure::{ChatlinePaths, ConfigStorage, TomlSelectionRepository};
use chatline_interaction::HttpChatBackend;

mod command;
mod helper;
mod logging;
mod shell;

use shell::Shell;

#[derive(Parser, Debug)]
#[command(name = "chatline")]
#[command(version, about = "Terminal client for the chat / agent-system backend", long_about = None)]
struct Cli {
    /// Backend origin, overrides the config file
    #[arg(long)]
    base_url: Option<String>,

    /// Backend flavor: chats, agent_systems or legacy
    #[arg(long)]
    flavor: Option<BackendFlavor>,

    /// Config file (default: ~/.config/chatline/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where the selection is persisted (default: ~/.config/chatline/selection.toml)
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Keep the selection in memory only
    #[arg(long, conflicts_with = "state_file")]
    ephemeral: bool,

    /// Log to stderr instead of the log file
    #[arg(long)]
    log_stderr: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = logging::init(&ChatlinePaths::log_dir()?, cli.log_stderr)?;

    // ===== Configuration =====
    let storage = match &cli.config {
        Some(path) => ConfigStorage::with_path(path.clone()),
        None => ConfigStorage::new()?,
    };
    let mut config = storage
        .load_or_init()
        .with_context(|| format!("Failed to load {}", storage.path().display()))?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(flavor) = cli.flavor {
        config.flavor = flavor;
    }
    config.validate()?;
    tracing::info!(base_url = %config.base_url, flavor = %config.flavor, "chatline starting");

    // ===== Wiring =====
    let repository: Arc<dyn SelectionRepository> = if cli.ephemeral {
        Arc::new(MemorySelectionRepository::new())
    } else {
        match cli.state_file {
            Some(path) => Arc::new(TomlSelectionRepository::with_path(path).await?),
            None => Arc::new(TomlSelectionRepository::new().await?),
        }
    };
    let backend = Arc::new(HttpChatBackend::new(&config)?);
    let (controller, events) = SyncController::new(backend, SessionStore::new(repository), &config);

    let mut shell = Shell::new(controller, events)?;
    shell.run().await
}
