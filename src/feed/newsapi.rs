//! Provider 1: newsapi.org `/everything` search.

use super::source::{
    article_url, endpoint, get_json, non_blank, parse_timestamp, text_or_empty, NewsSource,
    SourceError,
};
use crate::storage::{Article, FeedQuery, Provider};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
    source: Option<NewsApiSourceRef>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSourceRef {
    name: Option<String>,
}

/// Adapter for newsapi.org.
///
/// Its title and description arrive as plain text, so no fields are
/// declared for sanitizing.
pub struct NewsApiSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    page_size: u32,
    timeout: Duration,
}

impl NewsApiSource {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
        page_size: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
            page_size,
            timeout,
        }
    }
}

#[async_trait]
impl NewsSource for NewsApiSource {
    fn provider(&self) -> Provider {
        Provider::NewsApi
    }

    async fn fetch_page(&self, query: &FeedQuery) -> Result<Vec<Article>, SourceError> {
        let key = self
            .api_key
            .as_ref()
            .ok_or(SourceError::MissingApiKey(Provider::NewsApi))?;

        let url = endpoint(
            &self.base_url,
            "everything",
            &[
                ("q", query.keyword.clone()),
                ("pageSize", self.page_size.to_string()),
                ("page", query.page.to_string()),
                ("apiKey", key.expose_secret().to_string()),
            ],
        )?;

        let body: EverythingResponse = get_json(self.client.get(url), self.timeout).await?;

        let total = body.articles.len();
        let articles: Vec<Article> = body.articles.into_iter().filter_map(normalize).collect();
        if articles.len() < total {
            tracing::debug!(
                provider = %Provider::NewsApi,
                skipped = total - articles.len(),
                "Skipped articles without a usable URL"
            );
        }

        Ok(articles)
    }
}

fn normalize(raw: NewsApiArticle) -> Option<Article> {
    Some(Article {
        url: article_url(raw.url.as_deref())?,
        title: text_or_empty(raw.title),
        description: text_or_empty(raw.description),
        image_url: non_blank(raw.url_to_image),
        published_at: raw.published_at.as_deref().and_then(parse_timestamp),
        source_name: raw
            .source
            .and_then(|s| s.name)
            .map(Arc::from)
            .unwrap_or_else(|| Arc::from("")),
        provider: Provider::NewsApi,
    })
}
