use super::newsapi::NewsApiSource;
use super::probe::{HttpProbe, Probe};
use super::source::{client_builder, NewsSource, TextField};
use super::worldnews::WorldNewsSource;
use crate::config::Config;
use crate::storage::{Article, FeedQuery};
use crate::util::sanitize;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Failures that leave a page with nothing to show.
///
/// A single provider failing is not one of these; it just contributes no
/// articles.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Every provider failed for this query.
    #[error("Could not reach any news source: {0}")]
    AllSourcesFailed(String),
    /// The background fetch task died before producing a result.
    #[error("Feed task failed: {0}")]
    TaskPanicked(String),
}

/// Fetches one page from every provider and reduces it to a clean,
/// recency-ordered list.
///
/// Cheap to clone; sources and prober are shared.
#[derive(Clone)]
pub struct Pipeline {
    sources: Vec<Arc<dyn NewsSource>>,
    probe: Arc<dyn Probe>,
    probe_concurrency: usize,
}

impl Pipeline {
    /// Sources are merged in provider order regardless of the order given.
    pub fn new(
        mut sources: Vec<Arc<dyn NewsSource>>,
        probe: Arc<dyn Probe>,
        probe_concurrency: usize,
    ) -> Self {
        sources.sort_by_key(|s| s.provider());
        Self {
            sources,
            probe,
            probe_concurrency: probe_concurrency.max(1),
        }
    }

    /// Wire up both providers and the HTTP prober from configuration.
    ///
    /// The providers share one client; the prober gets its own so its
    /// redirect policy can enforce the private-host rule.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = client_builder(config).build()?;
        let newsapi = NewsApiSource::new(
            client.clone(),
            config.newsapi_base_url.clone(),
            config.newsapi_key(),
            config.page_size,
            config.request_timeout(),
        );
        let worldnews = WorldNewsSource::new(
            client.clone(),
            config.worldnews_base_url.clone(),
            config.worldnews_key(),
            config.language.clone(),
            config.page_size,
            config.request_timeout(),
        );
        let probe = HttpProbe::new(
            client_builder(config),
            config.probe_timeout(),
            config.allow_private_hosts,
        )?;

        Ok(Self::new(
            vec![Arc::new(newsapi), Arc::new(worldnews)],
            Arc::new(probe),
            config.probe_concurrency,
        ))
    }

    /// Produce one page for `query`.
    ///
    /// 1. Fetch the page from every provider concurrently, waiting for all.
    /// 2. Concatenate in provider order.
    /// 3. Sanitize each provider's declared free-text fields.
    /// 4. Drop articles with empty or `[Removed]` title/description, then
    ///    repeated URLs (first occurrence wins).
    /// 5. Probe the survivors concurrently, waiting for all; drop unreachable.
    /// 6. Stable sort by `published_at`, newest first, undated last.
    ///
    /// An empty page is a valid result. The only error is every provider
    /// failing.
    pub async fn run(&self, query: &FeedQuery) -> Result<Vec<Article>, PipelineError> {
        let fetches = self.sources.iter().map(|source| async move {
            (source, source.fetch_page(query).await)
        });

        let mut merged = Vec::new();
        let mut failures = Vec::new();
        for (source, result) in join_all(fetches).await {
            match result {
                Ok(articles) => {
                    tracing::debug!(
                        provider = %source.provider(),
                        keyword = %query.keyword,
                        page = query.page,
                        count = articles.len(),
                        "Source page fetched"
                    );
                    let fields = source.free_text_fields();
                    merged.extend(articles.into_iter().map(|a| sanitize_fields(a, fields)));
                }
                Err(e) => {
                    tracing::warn!(
                        provider = %source.provider(),
                        keyword = %query.keyword,
                        page = query.page,
                        error = %e,
                        "Source failed, continuing without it"
                    );
                    failures.push(format!("{}: {}", source.provider(), e));
                }
            }
        }

        if !self.sources.is_empty() && failures.len() == self.sources.len() {
            return Err(PipelineError::AllSourcesFailed(failures.join("; ")));
        }

        let candidates = dedup_by_url(keep_displayable(merged));
        let reachable = self.keep_reachable(candidates).await;
        let articles = order_by_recency(reachable);

        tracing::info!(
            keyword = %query.keyword,
            page = query.page,
            count = articles.len(),
            failed_sources = failures.len(),
            "Feed page ready"
        );
        Ok(articles)
    }

    async fn keep_reachable(&self, articles: Vec<Article>) -> Vec<Article> {
        let before = articles.len();
        let probe = &self.probe;

        // `buffered` keeps input order, so the merge-order tie-break survives.
        let kept: Vec<Article> = stream::iter(articles)
            .map(|article| async move {
                let reachable = probe.is_reachable(&article.url).await;
                reachable.then_some(article)
            })
            .buffered(self.probe_concurrency)
            .filter_map(|a| async move { a })
            .collect()
            .await;

        if kept.len() < before {
            tracing::debug!(dropped = before - kept.len(), "Dropped unreachable articles");
        }
        kept
    }
}

fn sanitize_fields(mut article: Article, fields: &[TextField]) -> Article {
    for field in fields {
        let slot = match field {
            TextField::Title => &mut article.title,
            TextField::Description => &mut article.description,
        };
        let clean = match sanitize(slot) {
            Cow::Borrowed(_) => continue,
            Cow::Owned(clean) => clean,
        };
        *slot = Arc::from(clean);
    }
    article
}

fn keep_displayable(articles: Vec<Article>) -> Vec<Article> {
    let before = articles.len();
    let kept: Vec<Article> = articles.into_iter().filter(Article::is_displayable).collect();
    if kept.len() < before {
        tracing::debug!(dropped = before - kept.len(), "Dropped empty or removed articles");
    }
    kept
}

fn dedup_by_url(articles: Vec<Article>) -> Vec<Article> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|a| seen.insert(Arc::clone(&a.url)))
        .collect()
}

/// Newest first; undated articles sink to the end. Stable, so equal
/// timestamps keep merge order (provider 1 before provider 2).
pub(crate) fn order_by_recency(mut articles: Vec<Article>) -> Vec<Article> {
    articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    articles
}
