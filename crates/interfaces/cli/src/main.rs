mod logging;
mod terminal;

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command as Process;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use occuview_client::{
    CapacityMonitorClient, Command, ConfigControlClient, ConfigView, DocumentBuffer, ErrorChannel,
    HttpTransport,
};
use occuview_config::{AppConfig, MonitorConfig};

use crate::terminal::TerminalCapacityView;

#[derive(Debug, Parser)]
#[command(
    name = "occuview",
    version,
    about = "Configure and monitor a capacity-tracking device"
)]
struct Cli {
    /// Client configuration file (TOML).  Missing files fall back to defaults.
    #[arg(long, global = true, value_name = "PATH", default_value = "config/occuview.toml")]
    config: PathBuf,

    /// Device origin, overriding `server.base_url` and `OCCUVIEW_SERVER_URL`.
    #[arg(long, global = true, value_name = "URL")]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inspect or change the device configuration document.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Write the effective client settings to the --config file.
    Init {
        /// Replace an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Send a counter command and show the configuration afterwards.
    Cmd {
        /// increment, decrement or reset.
        #[arg(value_parser = str::parse::<Command>)]
        command: Command,
        /// JSON payload sent as `data` (defaults to null).
        #[arg(long, value_name = "JSON")]
        data: Option<String>,
    },
    /// Continuously display the current capacity until Ctrl-C.
    Monitor,
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Print the current document.
    Show,
    /// Upload a document verbatim from PATH (or stdin) and print the result.
    Save {
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
    /// Open the current document in $EDITOR and upload it on exit.
    Edit,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if let Some(server) = cli.server {
        config.server.base_url = server;
    }

    if let Commands::Init { force } = cli.command {
        return write_settings(&config, &cli.config, force);
    }

    let _log_guard = logging::init(&config.telemetry)?;
    let transport = Arc::new(HttpTransport::new(&config.server)?);
    info!(server = %transport.base_url(), "occuview starting");

    match cli.command {
        Commands::Config { command } => run_config_command(transport, command).await,
        Commands::Cmd { command, data } => {
            let data = match data {
                Some(raw) => serde_json::from_str(&raw).context("--data is not valid JSON")?,
                None => serde_json::Value::Null,
            };
            let session = ConfigSession::new(transport);
            let ok = session
                .client
                .dispatch_command_with(command, data)
                .await;
            session.finish(ok)
        }
        Commands::Monitor => run_monitor(transport, &config.monitor).await,
        Commands::Init { .. } => Ok(()),
    }
}

fn write_settings(config: &AppConfig, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to replace it)", path.display());
    }
    config
        .save_to(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}

/// One configuration-view lifetime: a document buffer, an error banner and
/// the client bound to both.
struct ConfigSession {
    buffer: DocumentBuffer,
    errors: ErrorChannel,
    client: ConfigControlClient<HttpTransport>,
}

impl ConfigSession {
    fn new(transport: Arc<HttpTransport>) -> Self {
        let buffer = DocumentBuffer::new();
        let errors = ErrorChannel::new();
        let client = ConfigControlClient::new(
            transport,
            Arc::new(buffer.clone()),
            Arc::new(errors.clone()),
        );
        Self {
            buffer,
            errors,
            client,
        }
    }

    /// Print the displayed document, or turn the banner into the exit error.
    fn finish(&self, ok: bool) -> Result<()> {
        if let Some(message) = self.errors.current() {
            bail!("{message}");
        }
        if !ok {
            bail!("operation failed");
        }
        println!("{}", self.buffer.document_text());
        Ok(())
    }
}

async fn run_config_command(transport: Arc<HttpTransport>, command: ConfigCommands) -> Result<()> {
    let session = ConfigSession::new(transport);
    let ok = match command {
        ConfigCommands::Show => session.client.load_config().await,
        ConfigCommands::Save { path } => {
            session.buffer.set_text(read_document(path.as_deref())?);
            session.client.save_config().await
        }
        ConfigCommands::Edit => {
            if !session.client.load_config().await {
                return session.finish(false);
            }
            let original = session.buffer.document_text();
            let edited = edit_in_editor(&original)?;
            if edited == original {
                println!("no changes");
                return Ok(());
            }
            session.buffer.set_text(edited);
            session.client.save_config().await
        }
    };
    session.finish(ok)
}

fn read_document(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn edit_in_editor(text: &str) -> Result<String> {
    let editor = std::env::var("VISUAL")
        .or_else(|_| std::env::var("EDITOR"))
        .unwrap_or_else(|_| "vi".to_string());
    let mut parts = editor.split_whitespace();
    let Some(program) = parts.next() else {
        bail!("EDITOR is empty");
    };

    let mut file = tempfile::Builder::new()
        .prefix("occuview-config-")
        .suffix(".json")
        .tempfile()?;
    file.write_all(text.as_bytes())?;
    file.flush()?;

    let status = Process::new(program)
        .args(parts)
        .arg(file.path())
        .status()
        .with_context(|| format!("failed to launch editor '{editor}'"))?;
    if !status.success() {
        bail!("editor '{editor}' exited with {status}; nothing was saved");
    }

    Ok(fs::read_to_string(file.path())?)
}

async fn run_monitor(transport: Arc<HttpTransport>, config: &MonitorConfig) -> Result<()> {
    let view = Arc::new(TerminalCapacityView::new());
    let monitor = CapacityMonitorClient::new(transport, view, config.poll_interval());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(monitor.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    let _ = shutdown_tx.send(true);
    let cycles = task.await?;
    println!();
    info!(cycles, "monitor stopped");
    Ok(())
}
