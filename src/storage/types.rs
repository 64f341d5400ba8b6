use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Providers
// ============================================================================

/// The news APIs an article can come from.
///
/// Declaration order is the merge order: provider 1 results are concatenated
/// before provider 2 results, which is the tie-break for equal timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Provider {
    /// newsapi.org `/everything`
    NewsApi,
    /// worldnewsapi.com `/search-news`
    WorldNews,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::NewsApi => "newsapi",
            Provider::WorldNews => "worldnews",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Article
// ============================================================================

/// Marker providers substitute for content that was taken down.
pub const REMOVED_MARKER: &str = "[Removed]";

/// A normalized news article.
///
/// Articles are keyed by `url`: two fetches returning the same URL are the
/// same logical article, regardless of which provider returned them.
///
/// Adapters fill absent provider fields with defaults (empty strings, `None`),
/// so a freshly normalized article may not be displayable yet; the pipeline
/// drops those via [`Article::is_displayable`] before anything reaches the feed.
///
/// String fields use `Arc<str>` so the article can be cloned into the saved
/// and favorite collections without copying text.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: Arc<str>,
    pub description: Arc<str>,
    pub url: Arc<str>,
    pub image_url: Option<Arc<str>>,
    pub published_at: Option<DateTime<Utc>>,
    pub source_name: Arc<str>,
    /// Which adapter produced this article.
    pub provider: Provider,
}

impl Article {
    /// True when title and description are non-empty and neither carries the
    /// `[Removed]` marker.
    pub fn is_displayable(&self) -> bool {
        let ok = |s: &str| !s.trim().is_empty() && !s.contains(REMOVED_MARKER);
        ok(&self.title) && ok(&self.description)
    }
}

// ============================================================================
// Queries
// ============================================================================

/// One page request against both providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub keyword: String,
    /// 1-based page number.
    pub page: u32,
}

impl FeedQuery {
    /// First page for a keyword.
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            page: 1,
        }
    }
}

impl fmt::Display for FeedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" page {}", self.keyword, self.page)
    }
}
