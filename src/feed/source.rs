use super::probe::redirect_policy;
use crate::config::Config;
use crate::storage::{Article, FeedQuery, Provider};
use crate::util::validate_url;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Errors a provider fetch can hit.
///
/// None of these are fatal to the feed: the pipeline logs them and treats
/// the provider as having returned nothing for that page.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Body was not the JSON shape the provider documents
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Response body exceeded the 5MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// No API key configured for this provider
    #[error("No API key configured for {0}")]
    MissingApiKey(Provider),
    /// Configured base URL could not be turned into a request URL
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

/// Text fields an adapter declares as raw markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    Description,
}

/// One news provider.
///
/// `fetch_page` returns one page of results already mapped into the common
/// [`Article`] shape. Absent provider fields are normalized to defaults
/// (empty strings, `None`); validity filtering is left to the pipeline.
#[async_trait]
pub trait NewsSource: Send + Sync {
    fn provider(&self) -> Provider;

    /// Fields the pipeline must run through [`crate::util::sanitize`].
    fn free_text_fields(&self) -> &'static [TextField] {
        &[]
    }

    async fn fetch_page(&self, query: &FeedQuery) -> Result<Vec<Article>, SourceError>;
}

/// Client settings shared by provider requests and probes.
pub(crate) fn client_builder(config: &Config) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .redirect(redirect_policy(config.allow_private_hosts))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(config.request_timeout())
}

/// Send a request and decode the JSON body.
///
/// Fails on timeout, non-2xx status, bodies over 5MB and malformed JSON.
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<T, SourceError> {
    let response = tokio::time::timeout(timeout, request.send())
        .await
        .map_err(|_| SourceError::Timeout)??;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::HttpStatus(status.as_u16()));
    }

    let bytes = tokio::time::timeout(timeout, read_limited_bytes(response, MAX_RESPONSE_SIZE))
        .await
        .map_err(|_| SourceError::Timeout)??;

    Ok(serde_json::from_slice(&bytes)?)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, SourceError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(SourceError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(SourceError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

/// Join a configured base URL and an endpoint path, attaching query pairs.
pub(crate) fn endpoint(
    base: &str,
    path: &str,
    params: &[(&str, String)],
) -> Result<url::Url, SourceError> {
    let joined = format!("{}/{}", base.trim_end_matches('/'), path);
    url::Url::parse_with_params(&joined, params).map_err(|e| SourceError::InvalidUrl(e.to_string()))
}

/// Parse a provider timestamp.
///
/// Accepts RFC 3339 (`2024-05-01T12:00:00Z`) and the space-separated
/// `2024-05-01 12:00:00` form, which is taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Article URL as a dedup key, or `None` if it is not a usable http(s) URL.
pub(crate) fn article_url(raw: Option<&str>) -> Option<Arc<str>> {
    let raw = raw?.trim();
    validate_url(raw).ok()?;
    Some(Arc::from(raw))
}

/// Optional text field, with blanks collapsed to `None`.
pub(crate) fn non_blank(raw: Option<String>) -> Option<Arc<str>> {
    raw.filter(|s| !s.trim().is_empty()).map(Arc::from)
}

/// Required text field, with absent values normalized to "".
pub(crate) fn text_or_empty(raw: Option<String>) -> Arc<str> {
    Arc::from(raw.unwrap_or_default())
}
