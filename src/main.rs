mod app;
mod components;
mod config;
mod error;
mod event;
mod handler;
mod id;
mod logging;
mod session;
mod store;
mod theme;
mod tree;
mod tui;
mod ui;
mod upload;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::app::App;
use crate::config::{AppConfig, GeneralConfig, StorageConfig, ThemeConfig, UploadConfig};
use crate::event::{Event, EventHandler};
use crate::id::UuidIds;
use crate::session::Session;
use crate::store::{JsonFileStore, KeyValueStore, MemoryStore, Persistence};
use crate::tui::{install_panic_hook, Tui};
use crate::upload::UploadOrchestrator;

/// A terminal organizer for course materials.
#[derive(Parser, Debug)]
#[command(name = "lms", version, about)]
struct Cli {
    /// Path to a config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path of the store file
    #[arg(long, conflicts_with = "ephemeral")]
    store: Option<PathBuf>,

    /// Keep everything in memory; nothing is saved
    #[arg(long)]
    ephemeral: bool,

    /// Replace the stored tree with the default course structure
    #[arg(long)]
    reset: bool,

    /// Simulated upload delay in milliseconds
    #[arg(long)]
    upload_delay_ms: Option<u64>,

    /// Disable mouse support
    #[arg(long)]
    no_mouse: bool,

    /// Color scheme: dark, light or custom
    #[arg(long)]
    theme: Option<String>,
}

impl Cli {
    /// Flags that override config file values.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                mouse: self.no_mouse.then_some(false),
            },
            storage: StorageConfig {
                path: self.store.as_ref().map(|p| p.display().to_string()),
            },
            upload: UploadConfig {
                delay_ms: self.upload_delay_ms,
            },
            theme: ThemeConfig {
                scheme: self.theme.clone(),
                custom: None,
            },
            ..AppConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    let _log_guard = logging::init(&config.log_directory(), config.log_level())?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), theme = config.theme_scheme(), "starting");

    let backend: Box<dyn KeyValueStore> = if cli.ephemeral {
        tracing::info!("using in-memory store");
        Box::new(MemoryStore::default())
    } else {
        let store = JsonFileStore::new(config.store_path());
        tracing::info!(path = %store.path().display(), "using file store");
        Box::new(store)
    };

    let mut session = Session::open(Persistence::new(backend), Box::new(UuidIds));
    if cli.reset {
        session.reset()?;
    }

    let orchestrator = UploadOrchestrator::new(Duration::from_millis(config.upload_delay_ms()));
    tracing::debug!(delay_ms = orchestrator.delay().as_millis() as u64, "upload delay");
    let theme = theme::resolve_theme(&config.theme);

    install_panic_hook();

    let mut tui = Tui::new(config.mouse_enabled())?;
    let mut app = App::new(session, orchestrator, theme, config.use_icons());
    let mut events = EventHandler::new(Duration::from_millis(16));
    let event_tx = events.sender();

    loop {
        tui.terminal_mut().draw(|frame| {
            ui::render(&mut app, frame);
        })?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key, &event_tx),
            Event::Mouse(mouse) => handler::handle_mouse_event(&mut app, mouse),
            Event::Paste(text) => app.handle_paste(&text),
            Event::Tick => app.clear_expired_status(),
            Event::Resize(_, _) => {}
            Event::UploadComplete(batch) => app.handle_upload_complete(batch),
        }

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;
    tracing::info!("exiting");
    Ok(())
}
