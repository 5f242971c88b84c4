use async_trait::async_trait;
use huename_color::Hsl;
use huename_engine::{parse_bounded, Classifier, ClassifierError};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::Result;

pub const DEFAULT_API_BASE: &str = "https://www.thecolorapi.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
const MAX_TIMEOUT_SECS: usize = 300;

pub const API_BASE_ENV: &str = "HUENAME_API_BASE";
pub const TIMEOUT_ENV: &str = "HUENAME_TIMEOUT_SECS";

/// Error bodies are cut to this many characters before they reach a message.
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ColorApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ColorApiConfig {
    /// Apply `HUENAME_API_BASE` / `HUENAME_TIMEOUT_SECS` as read by `lookup`.
    /// The timeout is clamped to `1..=300` seconds.
    #[must_use]
    pub fn with_overrides_from(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup(API_BASE_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(self.base_url);
        let current = usize::try_from(self.timeout.as_secs()).unwrap_or(MAX_TIMEOUT_SECS);
        let secs = parse_bounded(
            lookup(TIMEOUT_ENV).as_deref(),
            current,
            1,
            MAX_TIMEOUT_SECS,
        );
        Self {
            base_url,
            timeout: Duration::from_secs(secs as u64),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    name: NameField,
}

#[derive(Debug, Deserialize)]
struct NameField {
    value: String,
}

/// Names colors through thecolorapi's `/id` endpoint.
///
/// One GET per call, no retries. Caching and concurrency limits are the
/// engine's business.
#[derive(Debug, Clone)]
pub struct ColorApiClassifier {
    client: Client,
    base_url: String,
}

impl ColorApiClassifier {
    pub fn new(config: ColorApiConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn id_url(&self, color: &Hsl) -> String {
        format!("{}/id?format=json&hsl={}", self.base_url, color.key())
    }
}

#[async_trait]
impl Classifier for ColorApiClassifier {
    type Item = Hsl;
    type Key = String;
    type Label = String;

    fn key(&self, item: &Hsl) -> String {
        item.key()
    }

    async fn classify(&self, item: &Hsl) -> std::result::Result<String, ClassifierError> {
        let url = self.id_url(item);
        log::trace!("GET {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| ClassifierError::Transport(format!("GET {url}: {err}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| ClassifierError::Transport(format!("GET {url}: {err}")))?;

        if !status.is_success() {
            return Err(ClassifierError::Service {
                status: status.as_u16(),
                message: truncate(body.trim(), ERROR_BODY_LIMIT),
            });
        }

        let parsed: IdResponse = serde_json::from_str(&body)
            .map_err(|err| ClassifierError::Decode(format!("GET {url}: {err}")))?;
        Ok(parsed.name.value)
    }
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
