use crate::util::{is_private_host, validate_url};
use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::time::Duration;

/// Redirect policy with loop detection, limited hops and the private-host
/// rule.
///
/// Article URLs from aggregators often bounce through tracking redirects;
/// up to 3 hops are followed. Unless `allow_private_hosts` is set, a hop to
/// a loopback/private host is refused, so a public URL cannot redirect a
/// request onto the local network.
pub fn redirect_policy(allow_private_hosts: bool) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        if !allow_private_hosts && is_private_host(url) {
            tracing::debug!(to = %url, "Refusing redirect to private host");
            return attempt.error("Redirect to private host refused");
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

/// Decides whether an article URL is still worth showing.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn is_reachable(&self, url: &str) -> bool;
}

/// Probes article URLs with a plain GET.
///
/// Policy is fail-open: only an HTTP 401 marks the article unreachable.
/// Timeouts, DNS failures, 404s and 5xx all keep it, so a flaky publisher
/// never shrinks the feed, while paywalled-and-revoked content is dropped.
pub struct HttpProbe {
    client: reqwest::Client,
    timeout: Duration,
    allow_private_hosts: bool,
}

impl HttpProbe {
    /// Builds the probe's client from `builder`, replacing any redirect
    /// policy with [`redirect_policy`] for `allow_private_hosts`.
    pub fn new(
        builder: reqwest::ClientBuilder,
        timeout: Duration,
        allow_private_hosts: bool,
    ) -> Result<Self, reqwest::Error> {
        let client = builder
            .redirect(redirect_policy(allow_private_hosts))
            .build()?;
        Ok(Self {
            client,
            timeout,
            allow_private_hosts,
        })
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn is_reachable(&self, url: &str) -> bool {
        let parsed = match validate_url(url) {
            Ok(u) => u,
            Err(e) => {
                tracing::debug!(url, error = %e, "Probe skipped: invalid URL, keeping article");
                return true;
            }
        };

        if !self.allow_private_hosts && is_private_host(&parsed) {
            tracing::debug!(url, "Probe skipped: private host, keeping article");
            return true;
        }

        // Only the status line matters; the body is dropped unread.
        match tokio::time::timeout(self.timeout, self.client.get(parsed).send()).await {
            Ok(Ok(response)) if response.status() == reqwest::StatusCode::UNAUTHORIZED => {
                tracing::debug!(url, status = 401, "Article unreachable, dropping");
                false
            }
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!(url, error = %e, "Probe failed, keeping article");
                true
            }
            Err(_) => {
                tracing::debug!(url, "Probe timed out, keeping article");
                true
            }
        }
    }
}
