use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, warn};
use std::path::PathBuf;
use sysdash::{ClientConfig, Command, Dashboard, FileBlobStore, MetricsClient, SettingsStore};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

mod commands;
mod terminal;

use commands::parse_command;
use terminal::{TerminalNotifier, TerminalView};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Base URL of the metrics API
    #[arg(long)]
    url: Option<String>,

    /// TOML file with connection settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding saved dashboard settings
    #[arg(long)]
    settings_dir: Option<PathBuf>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Override the saved refresh interval (seconds)
    #[arg(long)]
    interval: Option<u32>,

    /// Fetch everything once, print the dashboard and exit
    #[arg(long)]
    once: bool,

    /// Disable colorized output
    #[arg(long)]
    no_color: bool,
}

fn client_config(args: &Args) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(url) = &args.url {
        config.base_url = url.clone();
    }
    if let Some(dir) = &args.settings_dir {
        config.settings_dir = dir.clone();
    }
    if let Some(timeout) = args.timeout_ms {
        config.request_timeout_ms = timeout;
    }
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    if args.no_color {
        colored::control::set_override(false);
    }

    let config = client_config(&args)?;
    debug!("[cli] using {config:?}");
    let client = MetricsClient::from_config(&config).context("creating metrics client")?;
    let settings = SettingsStore::new(Box::new(FileBlobStore::new(&config.settings_dir)));

    let mut dashboard = Dashboard::new(
        client,
        settings,
        TerminalView::new(!args.once),
        TerminalNotifier::new(),
    );
    if let Some(seconds) = args.interval {
        dashboard.set_refresh_interval(seconds);
    }

    if args.once {
        dashboard.refresh_now().await;
        print!("{}", dashboard.view().frame());
        return Ok(());
    }

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(read_commands(tx));
    dashboard.run(rx).await;
    Ok(())
}

async fn read_commands(tx: mpsc::UnboundedSender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_command(&line) {
                Ok(Some(command)) => {
                    if tx.send(command).is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(message) => eprintln!("{message}"),
            },
            Ok(None) => {
                // stdin closed; keep the dashboard running until Ctrl-C
                debug!("[cli] stdin closed");
                break;
            }
            Err(err) => {
                warn!("[cli] failed to read stdin: {err}");
                break;
            }
        }
    }
    tx.closed().await;
}
