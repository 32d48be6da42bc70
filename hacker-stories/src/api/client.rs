use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::api::models::{SearchResponse, Story};

pub const DEFAULT_ENDPOINT: &str = "https://hn.algolia.com/api/v1/search";

/// Reasons a search request can fail.
///
/// These are only ever logged; the stories state collapses all of them
/// into a single failure.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid endpoint '{endpoint}': {source}")]
    InvalidUrl {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("server responded with status {0}")]
    Status(reqwest::StatusCode),

    #[error("could not decode response body: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Anything that can resolve a search URL into a list of stories
#[async_trait]
pub trait StoriesSource: Send + Sync {
    async fn fetch_stories(&self, url: &Url) -> Result<Vec<Story>, ApiError>;

    /// Get source name for debugging
    fn name(&self) -> &str;
}

/// Parse and validate the search endpoint
pub fn parse_endpoint(endpoint: &str) -> Result<Url, ApiError> {
    Url::parse(endpoint).map_err(|source| ApiError::InvalidUrl {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// Build `<endpoint>?query=<term>`, replacing any query already on the endpoint
pub fn build_search_url(endpoint: &Url, term: &str) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut().clear().append_pair("query", term);
    url
}

/// Client for the Hacker News search API
#[derive(Clone)]
pub struct HnApiClient {
    client: reqwest::Client,
}

impl HnApiClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HnApiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoriesSource for HnApiClient {
    async fn fetch_stories(&self, url: &Url) -> Result<Vec<Story>, ApiError> {
        debug!(target: "api", "GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(ApiError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            warn!(target: "api", "GET {} returned {}", url, status);
            return Err(ApiError::Status(status));
        }

        let body: SearchResponse = response.json().await.map_err(ApiError::Decode)?;
        debug!(target: "api", "GET {} returned {} hits", url, body.hits.len());
        Ok(body.hits)
    }

    fn name(&self) -> &str {
        "HnApiClient"
    }
}
