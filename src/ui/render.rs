//! Render functions for the terminal session.
//!
//! Everything here builds a `String`; the loop decides where it goes.
//! Provider text is untrusted, so every field passes through
//! `strip_control_chars` before it reaches the terminal.

use newsreel::app::{App, FeedPhase, FeedState};
use newsreel::storage::{Article, ArticleCollection};
use newsreel::util::{strip_control_chars, truncate_to_width};
use std::fmt::Write;

/// Column budget for one list line.
pub(super) const LINE_WIDTH: usize = 100;

/// Title column width inside a list line.
const TITLE_WIDTH: usize = 72;

/// Render the feed: header, state line, article list.
pub(super) fn render_feed(feed: &FeedState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", header(feed));

    match feed.phase() {
        FeedPhase::Idle => {
            let _ = writeln!(out, "  Nothing loaded yet. Try `search <keyword>` or `tags`.");
        }
        FeedPhase::LoadingInitial => {
            let _ = writeln!(out, "  Loading...");
        }
        FeedPhase::Error => {
            let msg = feed.error().unwrap_or("Unknown error");
            let _ = writeln!(out, "  Error: {}", strip_control_chars(msg));
            if !feed.articles().is_empty() {
                out.push_str(&render_list(feed.articles()));
            }
            let _ = writeln!(out, "  `refresh` to retry.");
        }
        FeedPhase::Ready if feed.is_empty_result() => {
            let _ = writeln!(
                out,
                "  No results for \"{}\".",
                strip_control_chars(feed.keyword())
            );
        }
        FeedPhase::Ready | FeedPhase::LoadingMore | FeedPhase::Refreshing => {
            out.push_str(&render_list(feed.articles()));
            if feed.is_loading_more() {
                let _ = writeln!(out, "  Loading more...");
            }
        }
    }

    out
}

fn header(feed: &FeedState) -> String {
    let keyword = strip_control_chars(feed.keyword());
    let mut line = if keyword.is_empty() {
        "newsreel".to_string()
    } else {
        format!(
            "newsreel | \"{}\" | {} articles | page {}",
            keyword,
            feed.articles().len(),
            feed.page()
        )
    };
    if feed.is_refreshing() {
        line.push_str(" | refreshing...");
    }
    truncate_to_width(&line, LINE_WIDTH).into_owned()
}

/// Numbered list, one article per line, numbering from 1.
pub(super) fn render_list(articles: &[Article]) -> String {
    let mut out = String::new();
    for (i, article) in articles.iter().enumerate() {
        let _ = writeln!(out, "{}", list_line(i + 1, article));
    }
    out
}

fn list_line(number: usize, article: &Article) -> String {
    let title = strip_control_chars(&article.title);
    let source = strip_control_chars(&article.source_name);
    let line = format!(
        "{:>3}. {:<width$}  {} {}",
        number,
        truncate_to_width(&title, TITLE_WIDTH),
        published_label(article),
        source,
        width = TITLE_WIDTH
    );
    truncate_to_width(&line, LINE_WIDTH).into_owned()
}

fn published_label(article: &Article) -> String {
    article
        .published_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "undated         ".to_string())
}

/// Full article view for `show <n>`.
pub(super) fn render_article(article: &Article, saved: bool, favorite: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", strip_control_chars(&article.title));
    let _ = writeln!(
        out,
        "{} | {} | via {}",
        strip_control_chars(&article.source_name),
        published_label(article).trim_end(),
        article.provider
    );
    let _ = writeln!(out, "{}", strip_control_chars(&article.url));
    if let Some(image) = &article.image_url {
        let _ = writeln!(out, "Image: {}", strip_control_chars(image));
    }
    let marks: Vec<&str> = [(saved, "saved"), (favorite, "favorite")]
        .into_iter()
        .filter_map(|(on, label)| on.then_some(label))
        .collect();
    if !marks.is_empty() {
        let _ = writeln!(out, "[{}]", marks.join(", "));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", strip_control_chars(&article.description));
    out
}

/// A saved/favorites listing.
pub(super) fn render_collection(name: &str, collection: &ArticleCollection) -> String {
    if collection.is_empty() {
        return format!("No {} articles.\n", name);
    }
    let mut out = format!("{} ({}):\n", capitalize(name), collection.len());
    out.push_str(&render_list(collection.list()));
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Quick-pick tags, numbered for `tag <n>`.
pub(super) fn render_tags(app: &App) -> String {
    let mut out = String::from("Tags:\n");
    for (i, tag) in app.tags.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {}", i + 1, strip_control_chars(tag));
    }
    out
}

pub(super) const HELP: &str = "\
Commands:
  search <keyword>   load page 1 for a keyword
  tag <name|n>       load a quick-pick tag
  tags               list quick-pick tags
  clear              back to the default keyword
  more               load the next page
  refresh            reload page 1 of the current keyword
  list               show the feed
  show <n>           show article n
  open <n>           open article n in the browser
  save <n>           save article n from the feed
  unsave <n>         remove entry n from the saved list
  fav <n>            favorite article n from the feed
  unfav <n>          remove entry n from the favorites list
  saved              list saved articles
  favorites          list favorite articles
  help               this text
  quit               exit
";
