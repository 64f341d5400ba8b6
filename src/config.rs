//! Configuration file parser for ~/.config/newsreel/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
//!
//! API keys may also come from the environment (`NEWSAPI_KEY`,
//! `WORLDNEWS_API_KEY`); the environment wins over the file.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the newsapi.org key.
pub const NEWSAPI_KEY_ENV: &str = "NEWSAPI_KEY";
/// Environment variable holding the worldnewsapi.com key.
pub const WORLDNEWS_KEY_ENV: &str = "WORLDNEWS_API_KEY";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
///
/// Custom Debug impl masks both API keys.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// newsapi.org key (alternative to NEWSAPI_KEY env var).
    pub newsapi_key: Option<String>,

    /// worldnewsapi.com key (alternative to WORLDNEWS_API_KEY env var).
    pub worldnews_key: Option<String>,

    /// Base URL for provider 1; `/everything` is appended.
    pub newsapi_base_url: String,

    /// Base URL for provider 2; `/search-news` is appended.
    pub worldnews_base_url: String,

    /// Articles requested per provider per page.
    pub page_size: u32,

    /// Language filter sent to provider 2.
    pub language: String,

    /// Keyword loaded on startup and restored by `clear`.
    pub default_keyword: String,

    /// Quick-pick keywords.
    pub tags: Vec<String>,

    /// Timeout for provider API requests.
    pub request_timeout_secs: u64,

    /// Timeout for a single reachability probe.
    pub probe_timeout_secs: u64,

    /// Maximum probes in flight at once.
    pub probe_concurrency: usize,

    /// Probe article URLs on loopback/private hosts. Off by default: such
    /// articles are kept without being contacted.
    pub allow_private_hosts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            newsapi_key: None,
            worldnews_key: None,
            newsapi_base_url: "https://newsapi.org/v2".to_string(),
            worldnews_base_url: "https://api.worldnewsapi.com".to_string(),
            page_size: 10,
            language: "en".to_string(),
            default_keyword: "AI".to_string(),
            tags: ["Renault", "Apple", "Google", "Nvidia", "Amazon", "Microsoft"]
                .into_iter()
                .map(String::from)
                .collect(),
            request_timeout_secs: 30,
            probe_timeout_secs: 10,
            probe_concurrency: 20,
            allow_private_hosts: false,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("newsapi_key", &self.newsapi_key.as_ref().map(|_| "[REDACTED]"))
            .field(
                "worldnews_key",
                &self.worldnews_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("newsapi_base_url", &self.newsapi_base_url)
            .field("worldnews_base_url", &self.worldnews_base_url)
            .field("page_size", &self.page_size)
            .field("language", &self.language)
            .field("default_keyword", &self.default_keyword)
            .field("tags", &self.tags)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("probe_timeout_secs", &self.probe_timeout_secs)
            .field("probe_concurrency", &self.probe_concurrency)
            .field("allow_private_hosts", &self.allow_private_hosts)
            .finish()
    }
}

const KNOWN_KEYS: [&str; 12] = [
    "newsapi_key",
    "worldnews_key",
    "newsapi_base_url",
    "worldnews_base_url",
    "page_size",
    "language",
    "default_keyword",
    "tags",
    "request_timeout_secs",
    "probe_timeout_secs",
    "probe_concurrency",
    "allow_private_hosts",
];

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            default_keyword = %config.default_keyword,
            page_size = config.page_size,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Provider 1 key: `NEWSAPI_KEY` if set, else the config file value.
    pub fn newsapi_key(&self) -> Option<SecretString> {
        pick_key(std::env::var(NEWSAPI_KEY_ENV).ok(), self.newsapi_key.as_deref())
    }

    /// Provider 2 key: `WORLDNEWS_API_KEY` if set, else the config file value.
    pub fn worldnews_key(&self) -> Option<SecretString> {
        pick_key(
            std::env::var(WORLDNEWS_KEY_ENV).ok(),
            self.worldnews_key.as_deref(),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }
}

/// Env value wins over file value; blank values count as unset.
fn pick_key(env: Option<String>, file: Option<&str>) -> Option<SecretString> {
    env.filter(|v| !v.trim().is_empty())
        .or_else(|| file.filter(|v| !v.trim().is_empty()).map(String::from))
        .map(SecretString::from)
}

// ============================================================================
// Tests
// ============================================================================
