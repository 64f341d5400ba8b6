//! Command parsing and dispatch for the terminal session.
//!
//! One line of stdin is one command. Parsing is pure; `handle_input` applies
//! the command to the app and prints the result.

use newsreel::app::{App, AppEvent};
use newsreel::util::MAX_KEYWORD_LENGTH;
use anyhow::Result;
use tokio::sync::mpsc;

use super::helpers::{article_at, open_article, ERR_NEED_NUMBER};
use super::render::{render_article, render_collection, render_feed, render_tags, HELP};
use super::Action;

fn invalid_keyword() -> String {
    format!("Keyword must be non-blank and at most {} bytes", MAX_KEYWORD_LENGTH)
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Command {
    Search(String),
    Tag(String),
    Tags,
    Clear,
    More,
    Refresh,
    List,
    Show(usize),
    Open(usize),
    Save(usize),
    Unsave(usize),
    Fav(usize),
    Unfav(usize),
    Saved,
    Favorites,
    Help,
    Quit,
    /// Blank line.
    Nothing,
}

/// Parse one input line. Command words are case-insensitive; arguments keep
/// their case.
pub(super) fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Nothing);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    let number = || rest.parse::<usize>().map_err(|_| ERR_NEED_NUMBER.to_string());

    let cmd = match word.to_ascii_lowercase().as_str() {
        "search" | "s" | "/" => Command::Search(rest.to_string()),
        "tag" | "t" if rest.is_empty() => return Err("Expected a tag name or number".into()),
        "tag" | "t" => Command::Tag(rest.to_string()),
        "tags" => Command::Tags,
        "clear" => Command::Clear,
        "more" | "m" => Command::More,
        "refresh" | "r" => Command::Refresh,
        "list" | "l" | "ls" => Command::List,
        "show" => Command::Show(number()?),
        "open" | "o" => Command::Open(number()?),
        "save" => Command::Save(number()?),
        "unsave" => Command::Unsave(number()?),
        "fav" => Command::Fav(number()?),
        "unfav" => Command::Unfav(number()?),
        "saved" => Command::Saved,
        "favorites" | "favs" => Command::Favorites,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(format!("Unknown command: {} (try `help`)", other)),
    };
    Ok(cmd)
}

/// Resolve a `tag` argument: a 1-based number into the tag list, or one of
/// its names. Free text goes through `search`.
fn resolve_tag(tags: &[String], arg: &str) -> Result<String, String> {
    if let Ok(n) = arg.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| tags.get(i))
            .cloned()
            .ok_or_else(|| format!("No tag {} (1-{})", n, tags.len()));
    }
    tags.iter()
        .find(|t| t.eq_ignore_ascii_case(arg))
        .cloned()
        .ok_or_else(|| format!("No tag named {} (see `tags`)", arg))
}

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    line: &str,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    let cmd = match parse_command(line) {
        Ok(cmd) => cmd,
        Err(msg) => {
            app.set_status(msg);
            return Ok(Action::Continue);
        }
    };
    tracing::debug!(command = ?cmd, "Handling command");

    match cmd {
        Command::Nothing => {}
        Command::Quit => return Ok(Action::Quit),
        Command::Help => print!("{}", HELP),

        Command::Search(keyword) => {
            if app.search(&keyword, event_tx) {
                print!("{}", render_feed(&app.feed));
            } else {
                app.set_status(invalid_keyword());
            }
        }
        Command::Tag(arg) => match resolve_tag(&app.tags, &arg) {
            Ok(tag) if app.select_tag(&tag, event_tx) => print!("{}", render_feed(&app.feed)),
            Ok(_) => app.set_status(invalid_keyword()),
            Err(msg) => app.set_status(msg),
        },
        Command::Tags => print!("{}", render_tags(app)),
        Command::Clear => {
            if app.clear_search(event_tx) {
                print!("{}", render_feed(&app.feed));
            } else {
                app.set_status(invalid_keyword());
            }
        }
        Command::More => {
            if !app.load_more(event_tx) {
                app.set_status("Nothing to load right now");
            }
        }
        Command::Refresh => {
            if app.refresh(event_tx) {
                app.set_status("Refreshing...");
            } else {
                app.set_status("Nothing to refresh yet");
            }
        }
        Command::List => print!("{}", render_feed(&app.feed)),

        Command::Show(n) => match article_at(app.feed.articles(), n) {
            Ok(article) => {
                let saved = app.library.saved.has(&article.url);
                let favorite = app.library.favorites.has(&article.url);
                print!("{}", render_article(article, saved, favorite));
            }
            Err(msg) => app.set_status(msg),
        },
        Command::Open(n) => {
            let result = article_at(app.feed.articles(), n).and_then(open_article);
            if let Err(msg) = result {
                app.set_status(msg);
            }
        }

        Command::Save(n) => {
            let msg = match article_at(app.feed.articles(), n) {
                Ok(article) if app.library.saved.add(article.clone()) => "Saved".to_string(),
                Ok(_) => "Already saved".to_string(),
                Err(msg) => msg,
            };
            app.set_status(msg);
        }
        Command::Fav(n) => {
            let msg = match article_at(app.feed.articles(), n) {
                Ok(article) if app.library.favorites.add(article.clone()) => {
                    "Added to favorites".to_string()
                }
                Ok(_) => "Already a favorite".to_string(),
                Err(msg) => msg,
            };
            app.set_status(msg);
        }
        Command::Unsave(n) => {
            let msg = match article_at(app.library.saved.list(), n) {
                Ok(article) => {
                    let url = article.url.clone();
                    app.library.saved.remove(&url);
                    "Removed from saved".to_string()
                }
                Err(msg) => msg,
            };
            app.set_status(msg);
        }
        Command::Unfav(n) => {
            let msg = match article_at(app.library.favorites.list(), n) {
                Ok(article) => {
                    let url = article.url.clone();
                    app.library.favorites.remove(&url);
                    "Removed from favorites".to_string()
                }
                Err(msg) => msg,
            };
            app.set_status(msg);
        }
        Command::Saved => print!("{}", render_collection("saved", &app.library.saved)),
        Command::Favorites => {
            print!("{}", render_collection("favorite", &app.library.favorites))
        }
    }

    Ok(Action::Continue)
}
