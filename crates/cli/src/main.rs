mod commands;

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fileselect_api::{ClientSettings, ParameterEventClient};
use fileselect_engine::{SelectionSession, SelectionStateMachine, TracingSink};
use fileselect_types::ParameterId;
use fileselect_util::{JsonSelectionStore, StoredSelectionBridge, WidgetConfig, app_config_path, path_from_env};
use tracing::{debug, info};

/// Environment variable overriding where the TUI writes its log.
const LOG_PATH_ENV: &str = "FILESELECT_LOG_PATH";
const LOG_FILE_NAME: &str = "tui.log";

#[derive(Debug, Parser)]
#[command(name = "fileselect", version, about = "Pick the file a pipeline parameter points at")]
struct Cli {
    /// Parameter whose file selection is managed.
    #[arg(long, short = 'p', env = "FILESELECT_PARAMETER_ID")]
    parameter_id: ParameterId,

    /// Backend base URL (overrides config and FILESELECT_API_BASE).
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Bearer token sent with every request.
    #[arg(long, global = true)]
    api_token: Option<String>,

    /// Selection store file.
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    /// Config file (defaults to FILESELECT_CONFIG_PATH or the config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive picker (default).
    Pick,
    /// Print the files the backend offers.
    List,
    /// Confirm a file without the interactive picker.
    Choose {
        #[arg(long, conflicts_with = "index", required_unless_present = "index")]
        name: Option<String>,
        #[arg(long)]
        index: Option<usize>,
    },
    /// Print the persisted selection.
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Pick);

    if matches!(command, Command::Pick) {
        init_file_tracing()?;
    } else {
        init_tracing();
    }

    let config = match &cli.config {
        Some(path) => WidgetConfig::load_from(path),
        None => WidgetConfig::load(),
    }
    .context("load configuration")?
    .with_overrides(cli.api_base, cli.api_token, cli.state_file);
    debug!(?config, "configuration resolved");

    let store = Arc::new(JsonSelectionStore::new(Some(config.state_path.clone())).context("open selection store")?);

    match command {
        Command::Show => {
            println!("{}", commands::show(&store, cli.parameter_id));
            Ok(())
        }
        Command::Pick => fileselect_tui::run(build_session(&config, store, cli.parameter_id)?).await,
        Command::List => {
            let session = build_session(&config, store, cli.parameter_id)?;
            println!("{}", commands::list(session).await?);
            Ok(())
        }
        Command::Choose { name, index } => {
            let target = match (name, index) {
                (Some(name), _) => commands::ChooseTarget::Name(name),
                (None, Some(index)) => commands::ChooseTarget::Index(index),
                (None, None) => anyhow::bail!("either --name or --index is required"),
            };
            let session = build_session(&config, store, cli.parameter_id)?;
            println!("{}", commands::choose(session, target).await?);
            Ok(())
        }
    }
}

fn build_session(config: &WidgetConfig, store: Arc<JsonSelectionStore>, parameter_id: ParameterId) -> Result<SelectionSession> {
    let settings = ClientSettings::new(config.api_base.clone()).with_token(config.api_token.clone());
    let client = ParameterEventClient::new(&settings).context("build API client")?;
    info!(%parameter_id, base_url = %client.base_url(), "file select session starting");

    let bridge = StoredSelectionBridge::new(store, parameter_id);
    let machine = SelectionStateMachine::new(parameter_id, Box::new(bridge), Arc::new(TracingSink));
    Ok(SelectionSession::new(machine, Arc::new(client)))
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// The TUI owns the terminal, so its logs go to a file instead.
fn init_file_tracing() -> Result<()> {
    let path = path_from_env(LOG_PATH_ENV).unwrap_or_else(|| app_config_path(LOG_FILE_NAME));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}
