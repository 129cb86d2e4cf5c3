//! HTTP JSON search back-end.
//!
//! Talks to any SearXNG-compatible endpoint: `GET <endpoint>?q=<text>&format=json`
//! returning `{"results": [{"title", "url", "content", "score"}, ...]}`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use searchfan_core::{ResultItem, SearchBackend, SearchError, SearchQuery, SearchResponse};

/// Default per-request timeout; strategies normally apply a tighter one.
const REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Wire Format
// ============================================================================

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    results: Vec<WireResult>,
}

#[derive(Debug, Deserialize)]
struct WireResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: Option<f64>,
}

/// Parses a JSON response body into normalized result items.
///
/// Results missing a URL are dropped by deserialization; everything else is
/// kept in the endpoint's own order, truncated to `limit` when given.
pub fn parse_results(
    backend_id: &str,
    body: &str,
    limit: Option<usize>,
) -> Result<Vec<ResultItem>, SearchError> {
    let wire: WireResponse = serde_json::from_str(body).map_err(|e| SearchError::Api {
        status: 200,
        message: format!("unparseable response body: {e}"),
    })?;

    let mut items: Vec<ResultItem> = wire
        .results
        .into_iter()
        .map(|r| ResultItem {
            title: r.title,
            url: r.url,
            snippet: r.content,
            score: r.score,
            source_backend: backend_id.to_string(),
        })
        .collect();

    if let Some(limit) = limit {
        items.truncate(limit);
    }

    Ok(items)
}

// ============================================================================
// Backend
// ============================================================================

/// [`SearchBackend`] over a SearXNG-compatible HTTP JSON endpoint.
#[derive(Debug)]
pub struct HttpSearchBackend {
    id: String,
    endpoint: url::Url,
    client: reqwest::Client,
}

impl HttpSearchBackend {
    /// Creates a back-end for the given id and endpoint URL.
    pub fn new(id: impl Into<String>, endpoint: &str) -> Result<Self, SearchError> {
        let endpoint = url::Url::parse(endpoint)
            .map_err(|e| SearchError::Config(format!("invalid endpoint: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SearchError::Config(format!("http client: {e}")))?;
        Ok(Self {
            id: id.into(),
            endpoint,
            client,
        })
    }

    /// The configured endpoint URL.
    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    fn query_url(&self, query: &SearchQuery) -> url::Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", &query.text)
            .append_pair("format", "json");
        url
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    fn id(&self) -> &str {
        &self.id
    }

    #[instrument(skip(self, query), fields(backend = %self.id))]
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        let url = self.query_url(query);
        let start = std::time::Instant::now();

        debug!(url = %url, "Sending search request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let items = parse_results(&self.id, &body, query.limit)?;
        let took_ms = start.elapsed().as_millis() as u64;

        debug!(items = items.len(), took_ms, "Search request completed");

        Ok(SearchResponse { items, took_ms })
    }
}

// ============================================================================
// Tests
// ============================================================================
