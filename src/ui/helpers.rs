//! Helper functions shared by the command handlers.

use newsreel::storage::Article;
use newsreel::util::validate_url;

/// Error message when a command needs an article number.
pub(super) const ERR_NEED_NUMBER: &str = "Expected an article number";

/// Look up a 1-based list number.
pub(super) fn article_at(articles: &[Article], number: usize) -> Result<&Article, String> {
    number
        .checked_sub(1)
        .and_then(|i| articles.get(i))
        .ok_or_else(|| match articles.len() {
            0 => "The list is empty".to_string(),
            len => format!("No article {} (1-{})", number, len),
        })
}

/// Hand the article URL to the system browser.
///
/// Only http(s) URLs are opened; a provider handing back `file:` or
/// `javascript:` never reaches the OS opener.
pub(super) fn open_article(article: &Article) -> Result<(), String> {
    let url = validate_url(&article.url).map_err(|e| format!("Cannot open article: {}", e))?;

    tracing::debug!(url = %url, "Opening article in browser");
    open::that(url.as_str()).map_err(|e| {
        tracing::warn!(url = %url, error = %e, "Failed to open browser");
        format!("Failed to open browser: {}", e)
    })
}
