use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_assistant::{CompletionClient, Config, HttpClient, SimulatedClient};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "chat")]
#[command(version, about = "Terminal chat front-end for a JSON chat backend")]
struct Cli {
    /// Backend base URL (POST <url>/api/chat)
    #[arg(long, env = "CHAT_API_BASE_URL")]
    base_url: Option<String>,

    /// Answer locally with a placeholder reply instead of calling a backend
    #[arg(long)]
    simulate: bool,

    /// Delay before the simulated reply arrives
    #[arg(long, default_value = "1000")]
    simulate_delay_ms: u64,

    /// Where to write logs (the terminal belongs to the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn default_log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("chat-assistant").join("chat.log"))
}

fn init_logging(path: Option<PathBuf>) -> Result<()> {
    let Some(path) = path.or_else(default_log_path) else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_assistant=info,chat=info".into()),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file)?;

    let config = Config::load().context("loading config")?;

    let (client, label): (Arc<dyn CompletionClient>, String) = if cli.simulate {
        let delay = Duration::from_millis(cli.simulate_delay_ms);
        (Arc::new(SimulatedClient::new(delay)), "simulated".to_string())
    } else {
        let base_url = config.resolve_base_url(cli.base_url.as_deref());
        let client = HttpClient::new(&base_url, config.request_timeout())?;
        let label = client.base_url().to_string();
        (Arc::new(client), label)
    };
    info!(backend = %label, "starting chat");

    let mut app = App::new(client, label);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(tui::TICK_RATE);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event).await?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    info!("chat closed");
    result
}
