use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::bail;
use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use hearthtui::sync::NoticeReceiver;
use hearthtui::ui;
use hearthtui::Config;
use hearthtui::Hub;
use hearthtui::HubClient;
use hearthtui::LogLevel;
use hearthtui::Outcome;
use hearthtui::Session;
use hearthtui::Synchronizer;
use tokio::sync::mpsc;

/// Terminal client for a Home Assistant hub
#[derive(Debug, Parser)]
#[command(name = "hearthtui", version, about)]
struct Cli {
    /// Hub base URL (overrides HASS_SERVER)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Long-lived access token (overrides HASS_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Auto-refresh period in seconds
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,

    /// Base log level, overriding the config file
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the interactive terminal UI (default)
    Tui,
    /// Print the entity table
    List {
        /// Only show entities of this domain
        #[arg(long)]
        domain: Option<String>,
    },
    /// Print one entity as JSON
    Get { entity_id: String },
    /// Toggle an entity and print its new state
    Toggle { entity_id: String },
}

fn init_logging(config: &Config, level: Option<LogLevel>) -> anyhow::Result<PathBuf> {
    let path = config.logging.file_path();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(config.logging.filter(level)?)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(interval) = cli.interval {
        config.refresh.interval_secs = interval;
    }

    let log_path = init_logging(&config, cli.log_level)?;
    tracing::info!("hearthtui starting, logging to {}", log_path.display());

    let credentials = config.resolve_credentials(cli.server, cli.token)?;
    tracing::info!("Using hub at {}", credentials.server);

    let client = HubClient::new(&credentials.server, credentials.token.clone())
        .with_timeout(config.request_timeout());

    let (notice_tx, notices) = mpsc::unbounded_channel();
    let sync = Arc::new(
        Synchronizer::new(client, notice_tx).with_settle_delay(config.settle_delay()),
    );

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => {
            ui::run(sync, notices, credentials.server, config.refresh_interval()).await
        }
        Command::List { domain } => list(&sync, domain.as_deref()).await,
        Command::Get { entity_id } => {
            let client = HubClient::new(&credentials.server, credentials.token)
                .with_timeout(config.request_timeout());
            get(client, &entity_id).await
        }
        Command::Toggle { entity_id } => toggle(&sync, notices, &entity_id).await,
    }
}

async fn load<H: Hub>(sync: &Synchronizer<H>) -> anyhow::Result<()> {
    match sync.connect_and_load().await {
        Outcome::Loaded(count) => {
            tracing::debug!("Loaded {} entities", count);
            Ok(())
        }
        Outcome::Failed(e) => Err(e.into()),
        other => bail!("Unexpected load outcome: {:?}", other),
    }
}

async fn list<H: Hub>(sync: &Synchronizer<H>, domain: Option<&str>) -> anyhow::Result<()> {
    load(sync).await?;
    let rows = ui::rows(&sync.snapshot(), domain);
    print!("{}", ui::render_plain(&rows));
    Ok(())
}

async fn get(mut client: HubClient, entity_id: &str) -> anyhow::Result<()> {
    let session = Session::open(&mut client)?;
    let entity = session
        .get_state(entity_id)
        .await
        .with_context(|| format!("Failed to fetch {}", entity_id))?;

    println!("{}", serde_json::to_string_pretty(&entity)?);
    Ok(())
}

async fn toggle<H: Hub>(
    sync: &Synchronizer<H>,
    mut notices: NoticeReceiver,
    entity_id: &str,
) -> anyhow::Result<()> {
    load(sync).await?;

    let outcome = sync.toggle_entity(entity_id).await;
    while let Ok(notice) = notices.try_recv() {
        eprintln!("[{}] {}", notice.severity, notice.message);
    }

    match outcome {
        Outcome::Toggled => {}
        Outcome::Ignored => bail!("Unknown entity {}", entity_id),
        Outcome::Failed(e) => return Err(e.into()),
        other => bail!("Unexpected toggle outcome: {:?}", other),
    }

    let snapshot = sync.snapshot();
    let state = snapshot
        .get(entity_id)
        .map(|entity| entity.state.as_str())
        .unwrap_or("unknown");
    println!("{} {}", entity_id, state);
    Ok(())
}
