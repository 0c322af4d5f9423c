use subsearch_types::{Post, SearchOptions, SearchQuery};
use tracing::debug;

use crate::error::ApiError;
use crate::listing::parse_posts;
use crate::{check_community, endpoint, read_json};

/// Unauthenticated client for the relay.
///
/// The relay holds the upstream credentials; this client never sees them.
#[derive(Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/search?subreddit=&keyword=&sort=&time=&limit=`.
    pub async fn search(
        &self,
        query: &SearchQuery,
        options: &SearchOptions,
    ) -> Result<Vec<Post>, ApiError> {
        if let Some(field) = query.missing_field() {
            return Err(ApiError::Validation(field));
        }

        let limit = options.effective_limit().to_string();
        debug!("relay search {} via {}", query, self.base_url);
        let resp = self
            .http
            .get(format!("{}/api/search", self.base_url))
            .query(&[
                ("subreddit", query.community_name()),
                ("keyword", query.keyword_text()),
                ("sort", options.sort.as_str()),
                ("time", options.time.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;
        parse_posts(read_json(resp).await?)
    }

    /// `GET /api/subreddit/{name}`.
    pub async fn about(&self, community: &str) -> Result<serde_json::Value, ApiError> {
        let query = SearchQuery::new(community, "");
        let name = check_community(query.community_name())?;
        let url = endpoint(&self.base_url, &["api", "subreddit", name])?;
        let resp = self.http.get(url).send().await?;
        read_json(resp).await
    }

    /// `GET /health` answered with `{"status": "ok"}`.
    pub async fn health(&self) -> Result<bool, ApiError> {
        let resp = self.http.get(format!("{}/health", self.base_url)).send().await?;
        let body = read_json(resp).await?;
        Ok(body.get("status").and_then(|s| s.as_str()) == Some("ok"))
    }
}
