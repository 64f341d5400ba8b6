//! Provider 2: worldnewsapi.com `/search-news`.

use super::source::{
    article_url, endpoint, get_json, non_blank, parse_timestamp, text_or_empty, NewsSource,
    SourceError, TextField,
};
use crate::storage::{Article, FeedQuery, Provider};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct SearchNewsResponse {
    #[serde(default)]
    news: Vec<WorldNewsArticle>,
}

#[derive(Debug, Deserialize)]
struct WorldNewsArticle {
    title: Option<String>,
    summary: Option<String>,
    url: Option<String>,
    image: Option<String>,
    publish_date: Option<String>,
    source_country: Option<String>,
}

/// Adapter for worldnewsapi.com.
///
/// The API key goes in the `x-api-key` header. `summary` often carries HTML
/// fragments and entities, so the description is declared free text.
pub struct WorldNewsSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    language: String,
    page_size: u32,
    timeout: Duration,
}

impl WorldNewsSource {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
        language: impl Into<String>,
        page_size: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
            language: language.into(),
            page_size,
            timeout,
        }
    }
}

#[async_trait]
impl NewsSource for WorldNewsSource {
    fn provider(&self) -> Provider {
        Provider::WorldNews
    }

    fn free_text_fields(&self) -> &'static [TextField] {
        &[TextField::Description]
    }

    async fn fetch_page(&self, query: &FeedQuery) -> Result<Vec<Article>, SourceError> {
        let key = self
            .api_key
            .as_ref()
            .ok_or(SourceError::MissingApiKey(Provider::WorldNews))?;

        let url = endpoint(
            &self.base_url,
            "search-news",
            &[
                ("text", query.keyword.clone()),
                ("language", self.language.clone()),
                ("limit", self.page_size.to_string()),
                ("page", query.page.to_string()),
            ],
        )?;

        let request = self
            .client
            .get(url)
            .header("x-api-key", key.expose_secret());
        let body: SearchNewsResponse = get_json(request, self.timeout).await?;

        Ok(body.news.into_iter().filter_map(normalize).collect())
    }
}

fn normalize(raw: WorldNewsArticle) -> Option<Article> {
    Some(Article {
        url: article_url(raw.url.as_deref())?,
        title: text_or_empty(raw.title),
        description: text_or_empty(raw.summary),
        image_url: non_blank(raw.image),
        published_at: raw.publish_date.as_deref().and_then(parse_timestamp),
        source_name: text_or_empty(raw.source_country),
        provider: Provider::WorldNews,
    })
}
