//! gridchat CLI - chat with a spreadsheet through the local bridge

mod chat;

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use gridchat_bridge::{BridgeConfig, MemoryHost, DEFAULT_ALLOWED_ORIGIN};
use gridchat_client::store::{self, API_KEY_KEY};
use gridchat_client::{
    Assistant, BackendApi, ClientConfig, FileStore, HttpBackend, KeyValueStore, OpenAiClient,
};
use gridchat_protocol::DEFAULT_PORT;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gridchat")]
#[command(author, version, about = "Chat with your spreadsheet")]
struct Cli {
    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the local bridge over CSV files
    Serve {
        /// CSV files to open; the last one is the active workbook
        #[arg(required = true)]
        csv: Vec<PathBuf>,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Origin allowed to call the bridge from a browser
        #[arg(long, default_value = DEFAULT_ALLOWED_ORIGIN)]
        origin: String,

        /// Workbook to focus instead of the last one opened (file name)
        #[arg(long)]
        active: Option<String>,

        /// Write changed sheets back to their CSV files
        #[arg(long)]
        save_on_write: bool,
    },

    /// Interactive chat (/clear, /reset, /status, /quit)
    Chat(ClientArgs),

    /// Ask a single question and print the reply
    Ask {
        question: String,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Print the write operations found in an assistant reply
    Extract {
        /// File holding the reply (default: stdin)
        input: Option<PathBuf>,
    },

    /// Probe the bridge once
    Health {
        /// Bridge URL (default: from config)
        #[arg(long)]
        backend: Option<String>,
    },

    /// Store the AI provider API key
    SetKey {
        /// The key (default: read from stdin)
        key: Option<String>,
    },

    /// Remove the stored API key
    ClearKey,
}

/// Overrides applied on top of the config file.
#[derive(Args, Clone, Default)]
struct ClientArgs {
    /// Config file (default: <config dir>/gridchat/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bridge URL
    #[arg(long)]
    backend: Option<String>,

    /// Model name
    #[arg(long)]
    model: Option<String>,

    /// Let the assistant write to the sheet
    #[arg(short, long)]
    write: bool,

    /// Target workbook (default: active)
    #[arg(long)]
    workbook: Option<String>,

    /// Target sheet (default: active)
    #[arg(long)]
    sheet: Option<String>,
}

impl ClientArgs {
    fn load_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load_from(path)
                .with_context(|| format!("Failed to load config '{}'", path.display()))?,
            None => ClientConfig::load().context("Failed to load config")?,
        };
        if let Some(backend) = &self.backend {
            config.backend_url = backend.clone();
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if self.write {
            config.write_mode = true;
        }
        if self.workbook.is_some() {
            config.workbook = self.workbook.clone();
        }
        if self.sheet.is_some() {
            config.sheet = self.sheet.clone();
        }
        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Serve {
            csv,
            host,
            port,
            origin,
            active,
            save_on_write,
        } => {
            let config = BridgeConfig {
                host,
                port,
                allowed_origin: origin,
            };
            let host = open_host(&csv, active.as_deref(), save_on_write)?;
            gridchat_bridge::serve(&config, Arc::new(host))
                .await
                .context("Bridge stopped")?;
            Ok(())
        }
        Commands::Chat(args) => {
            let assistant = build_assistant(&args.load_config()?)?;
            chat::run(assistant).await
        }
        Commands::Ask { question, client } => {
            let assistant = build_assistant(&client.load_config()?)?;
            chat::ask_once(&assistant, &question).await
        }
        Commands::Extract { input } => extract(input),
        Commands::Health { backend } => {
            let url = match backend {
                Some(url) => url,
                None => ClientConfig::load()?.backend_url,
            };
            health(&url).await
        }
        Commands::SetKey { key } => set_key(key),
        Commands::ClearKey => {
            FileStore::default_location()?.remove(API_KEY_KEY)?;
            eprintln!("API key removed");
            Ok(())
        }
    }
}

fn open_host(files: &[PathBuf], active: Option<&str>, save_on_write: bool) -> Result<MemoryHost> {
    let host = MemoryHost::new().with_save_on_write(save_on_write);
    for path in files {
        host.open_csv(path)
            .with_context(|| format!("Failed to open '{}'", path.display()))?;
    }
    if let Some(name) = active {
        host.activate(name).with_context(|| {
            format!(
                "Cannot activate '{name}'; open workbooks: {}",
                host.workbook_names().join(", ")
            )
        })?;
    }
    Ok(host)
}

fn build_assistant(config: &ClientConfig) -> Result<Assistant> {
    let store = Arc::new(FileStore::default_location()?);
    let api_key = store::api_key(store.as_ref())?;
    if api_key.is_none() {
        tracing::warn!(
            "no API key; run `gridchat set-key` or set {}",
            store::API_KEY_ENV
        );
    }
    let backend: Arc<dyn BackendApi> = Arc::new(
        HttpBackend::new(&config.backend_url)
            .with_context(|| format!("Invalid backend URL '{}'", config.backend_url))?,
    );
    let completion = Arc::new(OpenAiClient::new(config, api_key)?);
    Ok(Assistant::new(config.clone(), backend, completion, store))
}

fn extract(input: Option<PathBuf>) -> Result<()> {
    let text = match &input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            text
        }
    };

    match gridchat_client::extract(&text) {
        Some(batch) => {
            let mut payload = json!({ "operations": batch.operations });
            if let Some(workbook) = batch.target.workbook {
                payload["workbook"] = json!(workbook);
            }
            if let Some(sheet) = batch.target.sheet {
                payload["sheet"] = json!(sheet);
            }
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        None => eprintln!("No operations found"),
    }
    Ok(())
}

async fn health(url: &str) -> Result<()> {
    let backend = HttpBackend::new(url)?;
    let report = backend
        .health()
        .await
        .with_context(|| format!("Failed to reach bridge at {url}"))?;
    if report.is_healthy() {
        println!(
            "healthy: {}",
            report.workbook.as_deref().unwrap_or("(unnamed workbook)")
        );
        Ok(())
    } else {
        bail!(
            "unhealthy: {}",
            report.error.as_deref().unwrap_or("unknown error")
        )
    }
}

fn set_key(key: Option<String>) -> Result<()> {
    let key = match key {
        Some(key) => key,
        None => {
            let mut line = String::new();
            std::io::stdin()
                .read_line(&mut line)
                .context("Failed to read key from stdin")?;
            line
        }
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("API key is empty");
    }
    let store = FileStore::default_location()?;
    store.set(API_KEY_KEY, key)?;
    eprintln!("API key saved to {}", store.path().display());
    Ok(())
}
