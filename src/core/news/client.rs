use std::time::Duration;

use reqwest::Url;
use tracing::{debug, warn};

use super::types::{Envelope, FetchParams, NewsPage};

pub const DEFAULT_BASE_URL: &str = "https://newsdata.io/api/1";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NewsError {
    #[error("network error: {reason}")]
    Network { status: Option<u16>, reason: String },
    #[error("provider error: {message}")]
    Provider { message: String, code: Option<String> },
    #[error("malformed provider response: {0}")]
    Decode(String),
}

impl NewsError {
    /// The request URL carries the API key, so it is stripped from the reason.
    fn transport(error: reqwest::Error) -> Self {
        let error = error.without_url();
        NewsError::Network {
            status: error.status().map(|status| status.as_u16()),
            reason: error.to_string(),
        }
    }
}

/// Anything that can serve pages of news for a set of parameters.
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync + 'static {
    async fn fetch_news(&self, params: &FetchParams) -> Result<NewsPage, NewsError>;
}

#[derive(Debug, Clone)]
pub struct NewsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NewsError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(NewsError::transport)?;
        Ok(Self::with_http(http, base_url, api_key))
    }

    pub fn with_http(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, params: &FetchParams) -> Result<Url, NewsError> {
        let endpoint = format!("{}/latest", self.base_url.trim_end_matches('/'));
        Url::parse_with_params(&endpoint, build_query(params, &self.api_key)).map_err(|error| {
            NewsError::Network {
                status: None,
                reason: format!("invalid endpoint {endpoint}: {error}"),
            }
        })
    }
}

#[async_trait::async_trait]
impl NewsSource for NewsClient {
    async fn fetch_news(&self, params: &FetchParams) -> Result<NewsPage, NewsError> {
        let url = self.endpoint(params)?;
        debug!(
            country = %params.country,
            language = %params.language,
            category = ?params.category,
            paged = params.page.is_some(),
            "requesting latest news"
        );

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(NewsError::transport)?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "news provider returned non-success status");
            return Err(NewsError::Network {
                status: Some(status.as_u16()),
                reason: format!(
                    "HTTP {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("unexpected status")
                ),
            });
        }

        let body = response.bytes().await.map_err(NewsError::transport)?;
        parse_envelope(&body)
    }
}

/// Query pairs in the order the provider documents them. Country and
/// language are always sent; the rest only when they carry a value.
pub fn build_query(params: &FetchParams, api_key: &str) -> Vec<(&'static str, String)> {
    let mut pairs = vec![
        ("apikey", api_key.to_string()),
        ("country", params.country.clone()),
        ("language", params.language.clone()),
    ];
    if let Some(category) = params.category {
        pairs.push(("category", category.as_str().to_string()));
    }
    let query = params.query.trim();
    if !query.is_empty() {
        pairs.push(("q", query.to_string()));
    }
    if let Some(page) = params.page.as_deref().filter(|page| !page.is_empty()) {
        pairs.push(("page", page.to_string()));
    }
    pairs
}

pub fn parse_envelope(raw: &[u8]) -> Result<NewsPage, NewsError> {
    let envelope: Envelope =
        serde_json::from_slice(raw).map_err(|error| NewsError::Decode(error.to_string()))?;
    match envelope {
        Envelope::Success(page) => Ok(page),
        Envelope::Error { results } => {
            let results = results.unwrap_or_default();
            let message = results
                .message
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| "Unknown API error".to_string());
            warn!(%message, code = ?results.code, "news provider reported an error");
            Err(NewsError::Provider {
                message,
                code: results.code,
            })
        }
    }
}
