//! botdesk terminal chat client.
//!
//! Relays messages to a Rasa dialogue service and signs users in with an
//! emailed one-time passcode when the service asks for it.

use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use botdesk_client::{IdentityProvider, RasaClient, SupabaseAuthClient};
use botdesk_engine::conversation::DEFAULT_ENDPOINT;
use botdesk_engine::IdentityStore;

mod app;
mod backend;
mod config;
mod event;
mod identity;
mod state;
mod ui;

use app::App;
use config::{ChatConfig, IdentityConfig};
use event::{BackendCommand, UiEvent};
use identity::UnconfiguredIdentity;

const DEFAULT_LOG_FILTER: &str = "botdesk=debug";

#[derive(Parser)]
#[command(name = "botdesk-tui")]
#[command(about = "Terminal chat client for a Rasa dialogue service")]
#[command(version)]
struct Cli {
    /// Dialogue service base URL
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Identity provider (Supabase) project URL
    #[arg(long, env = "BOTDESK_SUPABASE_URL")]
    supabase_url: Option<String>,

    /// Identity provider anon key
    #[arg(long, env = "BOTDESK_SUPABASE_ANON_KEY", hide_env_values = true)]
    supabase_anon_key: Option<String>,

    /// Title shown in the header
    #[arg(long, default_value = "Chat Assistant")]
    title: String,

    /// Subtitle shown next to the title
    #[arg(long, default_value = "")]
    subtitle: String,

    /// Placeholder for the empty input line
    #[arg(long, default_value = "Type your message...")]
    input_hint: String,

    /// Name shown next to bot messages
    #[arg(long, default_value = "Bot")]
    bot_name: String,

    /// Log file (the terminal is owned by the UI)
    #[arg(long, default_value = "/tmp/botdesk-tui.log")]
    log_file: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    // Write to file to avoid terminal interference
    if let Ok(file) = std::fs::File::create(&cli.log_file) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_env_filter(filter)
            .with_ansi(false)
            .init();
    }

    let chat = ChatConfig {
        endpoint: cli.endpoint,
        title: cli.title,
        subtitle: cli.subtitle,
        input_hint: cli.input_hint,
        bot_name: cli.bot_name,
    };
    let identity_config = IdentityConfig {
        url: cli.supabase_url,
        anon_key: cli.supabase_anon_key,
    };

    run_chat_tui(chat, identity_config)
}

fn run_chat_tui(chat: ChatConfig, identity_config: IdentityConfig) -> Result<(), Box<dyn Error>> {
    info!(endpoint = %chat.endpoint, "Starting chat TUI");

    let provider: Arc<dyn IdentityProvider> = match identity_config.credentials() {
        Some((url, key)) => {
            info!(url = %url, "Using identity provider");
            Arc::new(SupabaseAuthClient::new(url, key))
        }
        None => {
            warn!("Identity provider URL or anon key missing; sign-in is disabled");
            eprintln!(
                "warning: BOTDESK_SUPABASE_URL / BOTDESK_SUPABASE_ANON_KEY not set, sign-in is disabled"
            );
            Arc::new(UnconfiguredIdentity)
        }
    };
    let identity = Arc::new(IdentityStore::new(provider));

    // Create channels for UI <-> backend communication
    let (ui_tx, ui_rx) = mpsc::channel::<UiEvent>(100);
    let (cmd_tx, cmd_rx) = mpsc::channel::<BackendCommand>(100);

    // Background thread with its own tokio runtime
    let runtime = tokio::runtime::Runtime::new()?;
    let backend_identity = Arc::clone(&identity);
    let bg_handle = std::thread::spawn(move || {
        runtime.block_on(backend::run_backend(
            backend_identity,
            Arc::new(RasaClient::new()),
            ui_tx,
            cmd_rx,
        ));
    });

    // Initialize terminal (enters alternate screen, enables raw mode)
    let terminal = ratatui::init();

    let mut app = App::new(chat, identity, ui_rx, cmd_tx);
    let result = app.run(terminal);

    // Restore terminal (exits alternate screen, disables raw mode)
    ratatui::restore();

    // Wait for background thread to finish
    let _ = bg_handle.join();

    info!("TUI shutdown complete");

    result.map_err(|e| e.into())
}
