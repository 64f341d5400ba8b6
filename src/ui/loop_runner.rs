//! Main event loop for the terminal session.
//!
//! Multiplexes stdin command lines, background fetch completions and
//! shutdown signals.

use newsreel::app::{App, AppEvent, FeedPhase};
use newsreel::util::MAX_KEYWORD_LENGTH;
use anyhow::{Context, Result};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use super::events::handle_app_event;
use super::input::handle_input;
use super::render::{render_feed, render_list};

/// Result of handling one command line.
pub enum Action {
    /// Keep reading commands.
    Continue,
    /// Exit the session.
    Quit,
}

/// Runs the interactive session.
///
/// Uses `tokio::select!` to multiplex:
/// - **Signals**: SIGTERM/SIGINT end the session (Unix only)
/// - **Commands**: one stdin line per command; EOF quits
/// - **Background tasks**: `FeedLoaded` completions from the pipeline
///
/// Loads `keyword` before reading the first command.
pub async fn run(
    app: &mut App,
    keyword: &str,
    event_tx: mpsc::Sender<AppEvent>,
    mut event_rx: mpsc::Receiver<AppEvent>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;

    println!("Type `help` for commands.");
    if !app.search(keyword, &event_tx) {
        app.set_status(format!("Ignoring startup keyword {:?}: blank or too long", keyword));
    }
    print!("{}", render_feed(&app.feed));
    flush_status(app);
    prompt();

    loop {
        #[cfg(unix)]
        let sigterm_fut = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sigint_fut = sigint.recv();
        #[cfg(not(unix))]
        let sigint_fut = std::future::pending::<Option<()>>();

        tokio::select! {
            biased;

            _ = sigterm_fut => {
                tracing::info!("Received SIGTERM, shutting down gracefully");
                break;
            }

            _ = sigint_fut => {
                tracing::info!("Received SIGINT, shutting down gracefully");
                break;
            }

            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    tracing::debug!("stdin closed");
                    break;
                };
                match handle_input(app, &line, &event_tx) {
                    Ok(Action::Quit) => break,
                    Ok(Action::Continue) => {}
                    Err(e) => app.set_status(format!("Error: {}", e)),
                }
                flush_status(app);
                prompt();
            }

            Some(event) = event_rx.recv() => {
                handle_app_event(app, event);
                flush_status(app);
                prompt();
            }
        }
    }

    Ok(())
}

/// Non-interactive mode: load `pages` pages of `keyword`, print, return.
///
/// Fails if page 1 cannot be loaded. A later page failing stops paging
/// and prints what was loaded.
pub async fn run_once(
    app: &mut App,
    keyword: &str,
    pages: u32,
    event_tx: mpsc::Sender<AppEvent>,
    mut event_rx: mpsc::Receiver<AppEvent>,
) -> Result<()> {
    if !app.search(keyword, &event_tx) {
        anyhow::bail!("Keyword must be non-blank and at most {} bytes", MAX_KEYWORD_LENGTH);
    }
    settle(app, &mut event_rx).await?;

    if app.feed.phase() == FeedPhase::Error {
        anyhow::bail!(
            "{}",
            app.feed.error().unwrap_or("Failed to load feed").to_string()
        );
    }

    for _ in 1..pages.max(1) {
        let before = app.feed.articles().len();
        if !app.load_more(&event_tx) {
            break;
        }
        settle(app, &mut event_rx).await?;
        if let Some(err) = app.feed.error() {
            tracing::warn!(error = %err, page = app.feed.page() + 1, "Stopped paging");
            break;
        }
        if app.feed.articles().len() == before {
            break;
        }
    }

    if app.feed.is_empty_result() {
        println!("No results for \"{}\".", keyword);
    } else {
        print!("{}", render_list(app.feed.articles()));
    }
    Ok(())
}

/// Process events until nothing is loading.
async fn settle(app: &mut App, event_rx: &mut mpsc::Receiver<AppEvent>) -> Result<()> {
    while app.feed.is_loading_initial() || app.feed.is_loading_more() || app.feed.is_refreshing()
    {
        let event = event_rx
            .recv()
            .await
            .context("Event channel closed while loading")?;
        app.handle_event(event);
    }
    Ok(())
}

fn flush_status(app: &mut App) {
    if let Some(msg) = app.take_status() {
        println!("{}", msg);
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}
