//! gomoku-peer — entry point.
//!
//! ```text
//! gomoku-peer                    Open the menu
//! gomoku-peer --host             Start hosting right away
//! gomoku-peer --join <ADDR>      Join ADDR right away (host[:port])
//! gomoku-peer --port <PORT>      Override the configured port
//! gomoku-peer --config <path>    Load a custom config TOML
//! gomoku-peer --gen-config       Write the default config to --config
//! ```

use std::fs::OpenOptions;
use std::io::Stdout;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use crossterm::event::{self, Event};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gomoku_peer::app::{App, UiEvent};
use gomoku_peer::config::PeerConfig;

/// Redraw and session refresh interval.
const TICK: Duration = Duration::from_millis(50);

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "gomoku-peer", about = "Two-player five-in-a-row over TCP")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "gomoku-peer.toml")]
    config: PathBuf,

    /// Write the default configuration to the config path and exit.
    #[arg(long)]
    gen_config: bool,

    /// Host a game immediately.
    #[arg(long, conflicts_with = "join")]
    host: bool,

    /// Join the host at ADDR immediately.
    #[arg(long, value_name = "ADDR")]
    join: Option<String>,

    /// Port to host on, overriding the config file.
    #[arg(short, long)]
    port: Option<u16>,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: write defaults and exit.
    if cli.gen_config {
        PeerConfig::write_default(&cli.config)?;
        println!("Wrote default configuration to {}", cli.config.display());
        return Ok(());
    }

    let mut config = PeerConfig::load(&cli.config);
    if let Some(port) = cli.port {
        config.network.port = port;
    }

    // Init tracing. The terminal belongs to the UI, so logs go to a file.
    if !config.logging.file.is_empty() {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.logging.file)?;
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }

    info!("gomoku-peer v{}", env!("CARGO_PKG_VERSION"));
    info!("port: {}", config.network.port);

    let mut app = App::new(&config);
    if cli.host {
        app.start_host().await;
    } else if let Some(address) = &cli.join {
        app.address = address.clone();
        app.start_join(address);
    }

    // Input thread: crossterm polling blocks, so it gets its own thread.
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    tokio::task::spawn_blocking(move || {
        while !ui_tx.is_closed() {
            if !event::poll(Duration::from_millis(10)).unwrap_or(false) {
                continue;
            }
            let sent = match event::read() {
                Ok(Event::Key(key)) => ui_tx.send(UiEvent::Key(key)),
                Ok(Event::Resize(w, h)) => ui_tx.send(UiEvent::Resize(w, h)),
                _ => Ok(()),
            };
            if sent.is_err() {
                break;
            }
        }
    });

    // Setup terminal
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;
    terminal.clear()?;

    let result = run(&mut terminal, &mut app, ui_rx).await;

    // Restore terminal
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    info!("exiting");

    result
}

/// UI loop: redraw, then wait for a key or the next tick.
async fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut tick = tokio::time::interval(TICK);
    loop {
        terminal.draw(|f| app.draw(f))?;

        tokio::select! {
            event = ui_rx.recv() => match event {
                Some(event) => app.handle_event(event).await,
                None => break,
            },
            _ = tick.tick() => app.tick(),
        }

        if app.exit {
            break;
        }
    }
    app.session.disconnect();
    Ok(())
}
