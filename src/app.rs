use crate::config::Config;
use crate::feed::{Pipeline, PipelineError};
use crate::storage::{Article, FeedQuery, Library};
use crate::util::MAX_KEYWORD_LENGTH;
use anyhow::Result;
use futures::FutureExt;
use std::borrow::Cow;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;

// ============================================================================
// Feed State Machine
// ============================================================================

/// Where the feed is in its fetch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    /// No query issued yet.
    Idle,
    /// Page 1 is loading with nothing valid on screen: a new keyword (list
    /// cleared) or a retry out of `Error` (earlier list kept until replaced).
    LoadingInitial,
    /// Showing articles (possibly none).
    Ready,
    /// Next page loading; current articles stay visible.
    LoadingMore,
    /// Page 1 of the current keyword reloading; current articles stay visible.
    Refreshing,
    /// The last initial/refresh fetch failed outright.
    Error,
}

/// What a fetch will do to the list when it lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// New keyword: replace.
    Initial,
    /// Same keyword, page 1 again: replace.
    Refresh,
    /// Next page: append.
    More,
}

/// Identifies one in-flight fetch.
///
/// `generation` is unique per ticket. A completion is only applied if its
/// ticket is still the one the state is waiting on; anything else belongs
/// to a superseded query and is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub query: FeedQuery,
    pub kind: FetchKind,
}

/// Result of feeding a completion into the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Stale,
}

/// The displayed feed and its loading/error flags.
///
/// Only [`FeedState::apply`] changes `articles` after a fetch starts, and
/// only for the ticket currently awaited. At most one replace fetch
/// (initial or refresh) and one append fetch are tracked at a time; starting
/// a replace fetch abandons any pending append.
#[derive(Debug)]
pub struct FeedState {
    keyword: String,
    /// Last page successfully loaded for `keyword`; 0 before the first.
    page: u32,
    articles: Vec<Article>,
    phase: FeedPhase,
    is_loading_initial: bool,
    is_loading_more: bool,
    refreshing: bool,
    error: Option<String>,
    generation: u64,
    pending_replace: Option<FetchTicket>,
    pending_more: Option<FetchTicket>,
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedState {
    pub fn new() -> Self {
        Self {
            keyword: String::new(),
            page: 0,
            articles: Vec::new(),
            phase: FeedPhase::Idle,
            is_loading_initial: false,
            is_loading_more: false,
            refreshing: false,
            error: None,
            generation: 0,
            pending_replace: None,
            pending_more: None,
        }
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    pub fn is_loading_initial(&self) -> bool {
        self.is_loading_initial
    }

    pub fn is_loading_more(&self) -> bool {
        self.is_loading_more
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Loaded successfully and found nothing. Distinct from the error state.
    pub fn is_empty_result(&self) -> bool {
        self.phase == FeedPhase::Ready && self.articles.is_empty()
    }

    fn next_ticket(&mut self, query: FeedQuery, kind: FetchKind) -> FetchTicket {
        self.generation = self.generation.wrapping_add(1);
        FetchTicket {
            generation: self.generation,
            query,
            kind,
        }
    }

    /// Start page 1 of a new keyword: search, tag selection and clearing the
    /// search all come through here. Blank or overlong input is ignored.
    pub fn submit_keyword(&mut self, raw: &str) -> Option<FetchTicket> {
        let keyword = raw.trim();
        if keyword.is_empty() {
            return None;
        }
        if keyword.len() > MAX_KEYWORD_LENGTH {
            tracing::debug!(len = keyword.len(), "Keyword too long, ignoring");
            return None;
        }
        Some(self.start_keyword(keyword))
    }

    /// Replace the feed with page 1 of `keyword`. Accumulated articles are
    /// discarded immediately. Callers validate `keyword` first.
    fn start_keyword(&mut self, keyword: &str) -> FetchTicket {
        let ticket = self.next_ticket(FeedQuery::new(keyword), FetchKind::Initial);
        tracing::debug!(keyword, generation = ticket.generation, "Starting new query");

        self.keyword = keyword.to_string();
        self.page = 0;
        self.articles.clear();
        self.phase = FeedPhase::LoadingInitial;
        self.is_loading_initial = true;
        self.is_loading_more = false;
        self.refreshing = false;
        self.error = None;
        self.pending_more = None;
        self.pending_replace = Some(ticket.clone());
        ticket
    }

    /// Reload page 1 of the current keyword, keeping the list on screen until
    /// the new page lands. No-op before the first query.
    ///
    /// From `Error` this is a retry and goes through `LoadingInitial`, not
    /// `Refreshing`.
    pub fn refresh(&mut self) -> Option<FetchTicket> {
        if self.phase == FeedPhase::Idle {
            return None;
        }

        let ticket = self.next_ticket(FeedQuery::new(self.keyword.clone()), FetchKind::Refresh);
        let retry = self.phase == FeedPhase::Error;
        tracing::debug!(
            keyword = %self.keyword,
            generation = ticket.generation,
            retry,
            "Refreshing"
        );

        if retry {
            self.phase = FeedPhase::LoadingInitial;
            self.is_loading_initial = true;
            self.refreshing = false;
            self.error = None;
        } else {
            self.phase = FeedPhase::Refreshing;
            self.is_loading_initial = false;
            self.refreshing = true;
        }
        self.is_loading_more = false;
        self.pending_more = None;
        self.pending_replace = Some(ticket.clone());
        Some(ticket)
    }

    /// Request the next page. Only honored from `Ready`; a request while a
    /// page is already loading is dropped, not queued.
    pub fn load_more(&mut self) -> Option<FetchTicket> {
        if self.phase != FeedPhase::Ready {
            tracing::debug!(phase = ?self.phase, "Load more ignored");
            return None;
        }

        let query = FeedQuery {
            keyword: self.keyword.clone(),
            page: self.page.saturating_add(1),
        };
        let ticket = self.next_ticket(query, FetchKind::More);
        tracing::debug!(
            keyword = %self.keyword,
            page = ticket.query.page,
            generation = ticket.generation,
            "Loading more"
        );

        self.phase = FeedPhase::LoadingMore;
        self.is_loading_more = true;
        self.pending_more = Some(ticket.clone());
        Some(ticket)
    }

    /// Commit a finished fetch.
    ///
    /// Completions whose ticket is no longer awaited return
    /// [`ApplyOutcome::Stale`] and leave the state untouched.
    pub fn apply(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<Article>, PipelineError>,
    ) -> ApplyOutcome {
        let slot = match ticket.kind {
            FetchKind::Initial | FetchKind::Refresh => &mut self.pending_replace,
            FetchKind::More => &mut self.pending_more,
        };
        if slot.as_ref() != Some(ticket) {
            tracing::debug!(
                generation = ticket.generation,
                query = %ticket.query,
                "Ignoring stale feed result"
            );
            return ApplyOutcome::Stale;
        }
        *slot = None;

        match ticket.kind {
            FetchKind::Initial | FetchKind::Refresh => self.apply_replace(ticket, result),
            FetchKind::More => self.apply_append(ticket, result),
        }
        ApplyOutcome::Applied
    }

    fn apply_replace(&mut self, ticket: &FetchTicket, result: Result<Vec<Article>, PipelineError>) {
        self.is_loading_initial = false;
        self.refreshing = false;

        match result {
            Ok(articles) => {
                tracing::debug!(query = %ticket.query, count = articles.len(), "Feed replaced");
                self.articles = articles;
                self.page = ticket.query.page;
                self.error = None;
                self.phase = FeedPhase::Ready;
            }
            Err(e) => {
                tracing::error!(query = %ticket.query, error = %e, "Feed load failed");
                self.error = Some(e.to_string());
                self.phase = FeedPhase::Error;
            }
        }
    }

    fn apply_append(&mut self, ticket: &FetchTicket, result: Result<Vec<Article>, PipelineError>) {
        self.is_loading_more = false;
        self.phase = FeedPhase::Ready;

        match result {
            Ok(articles) => {
                let shown: HashSet<Arc<str>> =
                    self.articles.iter().map(|a| Arc::clone(&a.url)).collect();
                let before = self.articles.len();
                self.articles
                    .extend(articles.into_iter().filter(|a| !shown.contains(&a.url)));
                self.page = ticket.query.page;
                self.error = None;
                tracing::debug!(
                    query = %ticket.query,
                    added = self.articles.len() - before,
                    "Feed page appended"
                );
            }
            Err(e) => {
                // Earlier pages stay; the next load-more retries this page.
                tracing::warn!(query = %ticket.query, error = %e, "Load more failed");
                self.error = Some(e.to_string());
            }
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// Events from background tasks.
pub enum AppEvent {
    /// A pipeline run finished.
    ///
    /// Fields:
    /// - `ticket`: the fetch this result belongs to
    /// - `result`: the page, or why it could not be produced
    FeedLoaded {
        ticket: FetchTicket,
        result: Result<Vec<Article>, PipelineError>,
    },
    /// A background task panicked.
    TaskPanicked { task: &'static str, error: String },
}

/// Run a future, converting a panic into its message.
pub(crate) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            }
        })
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state for one session.
pub struct App {
    pub pipeline: Pipeline,
    pub feed: FeedState,
    /// Saved and favorite articles; lives as long as the session.
    pub library: Library,
    pub default_keyword: String,
    pub tags: Vec<String>,

    /// One-shot message for the next render.
    pub status_message: Option<Cow<'static, str>>,

    /// Handle of the running replace fetch, aborted when superseded.
    replace_handle: Option<tokio::task::JoinHandle<()>>,
    /// Handle of the running append fetch, aborted when superseded.
    more_handle: Option<tokio::task::JoinHandle<()>>,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let pipeline = Pipeline::from_config(config)?;
        Ok(Self::with_pipeline(pipeline, config))
    }

    /// Build around an existing pipeline.
    pub fn with_pipeline(pipeline: Pipeline, config: &Config) -> Self {
        Self {
            pipeline,
            feed: FeedState::new(),
            library: Library::new(),
            default_keyword: config.default_keyword.clone(),
            tags: config.tags.clone(),
            status_message: None,
            replace_handle: None,
            more_handle: None,
        }
    }

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some(msg.into());
    }

    pub fn take_status(&mut self) -> Option<Cow<'static, str>> {
        self.status_message.take()
    }

    /// Search for a typed keyword.
    pub fn search(&mut self, raw: &str, tx: &mpsc::Sender<AppEvent>) -> bool {
        match self.feed.submit_keyword(raw) {
            Some(ticket) => {
                self.spawn_fetch(ticket, tx);
                true
            }
            None => false,
        }
    }

    /// Jump to a quick-pick tag by name.
    pub fn select_tag(&mut self, tag: &str, tx: &mpsc::Sender<AppEvent>) -> bool {
        self.search(tag, tx)
    }

    /// Drop the search and go back to the default keyword.
    pub fn clear_search(&mut self, tx: &mpsc::Sender<AppEvent>) -> bool {
        let keyword = self.default_keyword.clone();
        self.search(&keyword, tx)
    }

    pub fn refresh(&mut self, tx: &mpsc::Sender<AppEvent>) -> bool {
        match self.feed.refresh() {
            Some(ticket) => {
                self.spawn_fetch(ticket, tx);
                true
            }
            None => false,
        }
    }

    pub fn load_more(&mut self, tx: &mpsc::Sender<AppEvent>) -> bool {
        match self.feed.load_more() {
            Some(ticket) => {
                self.spawn_fetch(ticket, tx);
                true
            }
            None => false,
        }
    }

    /// Run the pipeline for `ticket` in the background.
    ///
    /// A replace fetch aborts whatever replace or append fetch was running;
    /// their results would be stale anyway. A panic in the pipeline still
    /// produces a `FeedLoaded` so the state never stays in a loading phase.
    fn spawn_fetch(&mut self, ticket: FetchTicket, tx: &mpsc::Sender<AppEvent>) {
        if ticket.kind != FetchKind::More {
            if let Some(handle) = self.replace_handle.take() {
                handle.abort();
            }
        }
        if let Some(handle) = self.more_handle.take() {
            handle.abort();
        }

        let kind = ticket.kind;
        let pipeline = self.pipeline.clone();
        let tx = tx.clone();

        let handle = tokio::spawn(async move {
            let result = match catch_task_panic(pipeline.run(&ticket.query)).await {
                Ok(result) => result,
                Err(panic_msg) => {
                    tracing::error!(error = %panic_msg, "Feed task panicked");
                    let _ = tx
                        .send(AppEvent::TaskPanicked {
                            task: "feed",
                            error: panic_msg.clone(),
                        })
                        .await;
                    Err(PipelineError::TaskPanicked(panic_msg))
                }
            };

            if let Err(e) = tx.send(AppEvent::FeedLoaded { ticket, result }).await {
                tracing::warn!(error = %e, event = "FeedLoaded", "Channel send failed (receiver dropped)");
            }
        });

        match kind {
            FetchKind::More => self.more_handle = Some(handle),
            FetchKind::Initial | FetchKind::Refresh => self.replace_handle = Some(handle),
        }
    }

    /// Apply a background event to the state.
    pub fn handle_event(&mut self, event: AppEvent) -> ApplyOutcome {
        match event {
            AppEvent::FeedLoaded { ticket, result } => self.feed.apply(&ticket, result),
            AppEvent::TaskPanicked { task, error } => {
                tracing::error!(task, error = %error, "Background task panicked");
                self.set_status(format!("Internal error in {} task", task));
                ApplyOutcome::Applied
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        for handle in [self.replace_handle.take(), self.more_handle.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::test_support::article;
    use crate::storage::Provider;
    use pretty_assertions::assert_eq;

    fn page(prefix: &str, n: usize) -> Vec<Article> {
        (0..n)
            .map(|i| article(&format!("https://{prefix}.test/{i}"), 1000 - i as i64, Provider::NewsApi))
            .collect()
    }

    fn all_down() -> PipelineError {
        PipelineError::AllSourcesFailed("newsapi: Request timed out; worldnews: Request timed out".into())
    }

    fn ready_with(keyword: &str, articles: Vec<Article>) -> FeedState {
        let mut state = FeedState::new();
        let t = state.start_keyword(keyword);
        state.apply(&t, Ok(articles));
        state
    }

    #[test]
    fn test_starts_idle() {
        let state = FeedState::new();
        assert_eq!(state.phase(), FeedPhase::Idle);
        assert!(state.articles().is_empty());
        assert!(!state.is_loading_initial());
        assert!(!state.is_loading_more());
    }

    #[test]
    fn test_new_keyword_loads_page_one() {
        let mut state = FeedState::new();
        let t = state.submit_keyword("  AI ").unwrap();
        assert_eq!(t.query, FeedQuery::new("AI"));
        assert_eq!(t.kind, FetchKind::Initial);
        assert_eq!(state.phase(), FeedPhase::LoadingInitial);
        assert!(state.is_loading_initial());

        assert_eq!(state.apply(&t, Ok(page("a", 10))), ApplyOutcome::Applied);
        assert_eq!(state.phase(), FeedPhase::Ready);
        assert_eq!(state.articles().len(), 10);
        assert_eq!(state.page(), 1);
        assert!(!state.is_loading_initial());
    }

    #[test]
    fn test_blank_search_ignored() {
        let mut state = ready_with("AI", page("a", 3));
        assert!(state.submit_keyword("   ").is_none());
        assert_eq!(state.keyword(), "AI");
        assert_eq!(state.articles().len(), 3);
    }

    #[test]
    fn test_overlong_search_ignored() {
        let mut state = FeedState::new();
        assert!(state.submit_keyword(&"x".repeat(MAX_KEYWORD_LENGTH + 1)).is_none());
        assert_eq!(state.phase(), FeedPhase::Idle);
    }

    #[test]
    fn test_blank_and_overlong_tag_names_ignored() {
        let mut state = ready_with("AI", page("a", 3));
        assert!(state.submit_keyword("").is_none());
        assert!(state.submit_keyword("\t").is_none());
        assert!(state.submit_keyword(&"t".repeat(MAX_KEYWORD_LENGTH + 1)).is_none());
        assert_eq!(state.keyword(), "AI");
        assert_eq!(state.phase(), FeedPhase::Ready);

        let longest = "t".repeat(MAX_KEYWORD_LENGTH);
        assert_eq!(state.submit_keyword(&longest).unwrap().query.keyword, longest);
    }

    #[tokio::test]
    async fn test_app_tag_and_clear_reject_invalid_keywords() {
        let config = Config {
            default_keyword: "   ".into(),
            ..Config::default()
        };
        let mut app = App::new(&config).unwrap();
        let (tx, _rx) = mpsc::channel(4);

        assert!(!app.select_tag("", &tx));
        assert!(!app.select_tag(&"x".repeat(MAX_KEYWORD_LENGTH + 1), &tx));
        assert!(!app.clear_search(&tx));
        assert_eq!(app.feed.phase(), FeedPhase::Idle);
    }

    #[test]
    fn test_new_keyword_clears_previous_articles() {
        let mut state = ready_with("AI", page("a", 10));
        state.start_keyword("Tesla");
        assert!(state.articles().is_empty());
        assert_eq!(state.page(), 0);
        assert_eq!(state.keyword(), "Tesla");
    }

    #[test]
    fn test_stale_keyword_result_discarded() {
        let mut state = FeedState::new();
        let ai = state.start_keyword("AI");
        let tesla = state.start_keyword("Tesla");

        // "AI" lands late.
        assert_eq!(state.apply(&ai, Ok(page("ai", 5))), ApplyOutcome::Stale);
        assert!(state.articles().is_empty());
        assert_eq!(state.phase(), FeedPhase::LoadingInitial);

        assert_eq!(state.apply(&tesla, Ok(page("tesla", 2))), ApplyOutcome::Applied);
        assert_eq!(state.keyword(), "Tesla");
        assert!(state.articles().iter().all(|a| a.url.contains("tesla")));

        // And after Tesla is applied, the late AI result still can't land.
        assert_eq!(state.apply(&ai, Ok(page("ai", 5))), ApplyOutcome::Stale);
        assert_eq!(state.articles().len(), 2);
    }

    #[test]
    fn test_load_more_appends() {
        let mut state = ready_with("AI", page("p1", 10));
        let t = state.load_more().unwrap();
        assert_eq!(t.query.page, 2);
        assert_eq!(t.kind, FetchKind::More);
        assert_eq!(state.phase(), FeedPhase::LoadingMore);
        assert!(state.is_loading_more());
        assert!(!state.is_loading_initial());

        state.apply(&t, Ok(page("p2", 10)));
        assert_eq!(state.articles().len(), 20);
        assert_eq!(state.page(), 2);
        assert_eq!(&*state.articles()[0].url, "https://p1.test/0");
        assert_eq!(&*state.articles()[10].url, "https://p2.test/0");
    }

    #[test]
    fn test_empty_next_page_keeps_earlier_pages() {
        let mut state = ready_with("AI", page("p1", 10));
        let t = state.load_more().unwrap();
        state.apply(&t, Ok(Vec::new()));

        assert_eq!(state.articles().len(), 10);
        assert!(!state.is_loading_more());
        assert_eq!(state.phase(), FeedPhase::Ready);
        assert_eq!(state.page(), 2);
    }

    #[test]
    fn test_load_more_skips_already_shown_urls() {
        let mut state = ready_with("AI", page("p1", 3));
        let t = state.load_more().unwrap();
        let mut next = page("p1", 2); // repeats
        next.extend(page("p2", 2));
        state.apply(&t, Ok(next));
        assert_eq!(state.articles().len(), 5);
    }

    #[test]
    fn test_second_load_more_while_loading_is_ignored() {
        let mut state = ready_with("AI", page("p1", 10));
        assert!(state.load_more().is_some());
        assert!(state.load_more().is_none());
    }

    #[test]
    fn test_load_more_not_allowed_while_initial_loading() {
        let mut state = FeedState::new();
        state.start_keyword("AI");
        assert!(state.load_more().is_none());
    }

    #[test]
    fn test_load_more_failure_keeps_articles() {
        let mut state = ready_with("AI", page("p1", 10));
        let t = state.load_more().unwrap();
        state.apply(&t, Err(all_down()));

        assert_eq!(state.articles().len(), 10);
        assert_eq!(state.phase(), FeedPhase::Ready);
        assert!(!state.is_loading_more());
        assert!(state.error().is_some());
        // Counter unchanged, so the retry asks for the same page.
        assert_eq!(state.page(), 1);
        assert_eq!(state.load_more().unwrap().query.page, 2);
    }

    #[test]
    fn test_initial_failure_enters_error() {
        let mut state = FeedState::new();
        let t = state.start_keyword("AI");
        state.apply(&t, Err(all_down()));

        assert_eq!(state.phase(), FeedPhase::Error);
        assert!(!state.error().unwrap_or_default().is_empty());
        assert!(state.articles().is_empty());
        assert!(!state.is_loading_initial());
        assert!(!state.is_empty_result());
        assert!(state.load_more().is_none());
    }

    #[test]
    fn test_new_query_recovers_from_error() {
        let mut state = FeedState::new();
        let t = state.start_keyword("AI");
        state.apply(&t, Err(all_down()));

        let t = state.submit_keyword("AI").unwrap();
        assert_eq!(state.phase(), FeedPhase::LoadingInitial);
        assert!(state.error().is_none());
        state.apply(&t, Ok(page("a", 1)));
        assert_eq!(state.phase(), FeedPhase::Ready);
    }

    #[test]
    fn test_refresh_replaces_and_keeps_keyword() {
        let mut state = ready_with("AI", page("old", 10));
        let more = state.load_more().unwrap();
        state.apply(&more, Ok(page("old2", 10)));

        let t = state.refresh().unwrap();
        assert_eq!(t.query, FeedQuery::new("AI"));
        assert_eq!(state.phase(), FeedPhase::Refreshing);
        assert!(state.is_refreshing());
        // List stays visible while refreshing.
        assert_eq!(state.articles().len(), 20);

        state.apply(&t, Ok(page("new", 4)));
        assert!(!state.is_refreshing());
        assert_eq!(state.articles().len(), 4);
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_refresh_failure_clears_flag_and_keeps_list() {
        let mut state = ready_with("AI", page("a", 10));
        let t = state.refresh().unwrap();
        state.apply(&t, Err(all_down()));

        assert!(!state.is_refreshing());
        assert_eq!(state.phase(), FeedPhase::Error);
        assert_eq!(state.articles().len(), 10);
    }

    #[test]
    fn test_retry_from_error_enters_loading_initial() {
        let mut state = ready_with("AI", page("a", 10));
        let t = state.refresh().unwrap();
        state.apply(&t, Err(all_down()));
        assert_eq!(state.phase(), FeedPhase::Error);

        let retry = state.refresh().unwrap();
        assert_eq!(retry.query, FeedQuery::new("AI"));
        assert_eq!(state.phase(), FeedPhase::LoadingInitial);
        assert!(state.is_loading_initial());
        assert!(!state.is_refreshing());
        assert!(state.error().is_none());
        assert!(state.load_more().is_none());

        state.apply(&retry, Ok(page("b", 3)));
        assert_eq!(state.phase(), FeedPhase::Ready);
        assert!(!state.is_loading_initial());
        assert_eq!(state.articles().len(), 3);
    }

    #[test]
    fn test_failed_retry_returns_to_error() {
        let mut state = FeedState::new();
        let t = state.start_keyword("AI");
        state.apply(&t, Err(all_down()));

        let retry = state.refresh().unwrap();
        state.apply(&retry, Err(all_down()));
        assert_eq!(state.phase(), FeedPhase::Error);
        assert!(!state.is_loading_initial());
        assert!(state.error().is_some());
    }

    #[test]
    fn test_refresh_before_any_query_is_noop() {
        let mut state = FeedState::new();
        assert!(state.refresh().is_none());
    }

    #[test]
    fn test_reset_abandons_pending_load_more() {
        let mut state = ready_with("AI", page("a", 10));
        let more = state.load_more().unwrap();
        let fresh = state.start_keyword("Tesla");
        assert!(!state.is_loading_more());

        assert_eq!(state.apply(&more, Ok(page("ai2", 10))), ApplyOutcome::Stale);
        state.apply(&fresh, Ok(page("tesla", 3)));
        assert_eq!(state.articles().len(), 3);
    }

    #[test]
    fn test_empty_result_is_not_error() {
        let state = ready_with("zzzz", Vec::new());
        assert!(state.is_empty_result());
        assert!(state.error().is_none());
    }

    #[test]
    fn test_tickets_are_unique() {
        let mut state = FeedState::new();
        let a = state.start_keyword("AI");
        let b = state.start_keyword("AI");
        assert_ne!(a, b);
        assert_eq!(state.apply(&a, Ok(page("a", 1))), ApplyOutcome::Stale);
    }
}
