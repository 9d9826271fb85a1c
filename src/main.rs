use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::sync::Arc;
use std::{io, time::Duration};
use tokio::sync::mpsc;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

mod app;
mod app_event;
mod cli;
mod config;
mod error;
mod models;
mod sftp_logic;
mod sftp_ui;
mod ssh_service;
mod ui;

use app::{App, Executor};
use app_event::{AppEvent, Msg};
use cli::Args;
use config::Settings;
use error::AppError;
use ssh_service::SshConnector;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let log_dir = config::resolve_log_dir(&args);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let log_file = log_dir.join(format!("sftpr_{}.log", Local::now().format("%Y%m%d_%H%M%S")));
    let file = File::create(&log_file)
        .with_context(|| format!("Failed to create log file {}", log_file.display()))?;

    fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(EnvFilter::from_default_env().add_directive("sftpr=debug".parse()?))
        .with_ansi(false)
        .with_writer(file)
        .init();

    debug!("Starting sftpr, logging to {}", log_file.display());

    // A broken config is reported on stderr before the terminal is taken over
    let settings = Settings::discover(&args)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (tx, rx) = mpsc::unbounded_channel();
    let executor = Executor::new(Arc::new(SshConnector), tx);
    let res = run_app(&mut terminal, App::new(settings), executor, rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("Exiting on error: {}", err);
        return Err(err.into());
    }

    debug!("sftpr exited cleanly");
    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    executor: Executor,
    mut events: mpsc::UnboundedReceiver<AppEvent>,
) -> Result<(), AppError> {
    let mut input = EventStream::new();
    // Redraws expire the status line even when nothing else happens
    let mut ticker = tokio::time::interval(Duration::from_millis(250));

    let size = terminal.size()?;
    app.update(Msg::Resize {
        width: size.width,
        height: size.height,
    });

    loop {
        terminal.draw(|f| ui::draw::<B>(f, &app))?;
        if app.should_quit() {
            return Ok(());
        }

        let msg = tokio::select! {
            maybe_event = input.next() => match maybe_event {
                Some(Ok(Event::Key(key))) => Msg::Key(key),
                Some(Ok(Event::Resize(width, height))) => Msg::Resize { width, height },
                Some(Ok(_)) => continue,
                Some(Err(err)) => return Err(err.into()),
                None => return Ok(()),
            },
            Some(event) = events.recv() => Msg::Event(event),
            _ = ticker.tick() => continue,
        };

        for command in app.update(msg) {
            executor.dispatch(command);
        }
    }
}
