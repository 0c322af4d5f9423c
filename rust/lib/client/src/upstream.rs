use std::sync::Arc;

use subsearch_types::{Post, SearchOptions, SearchQuery};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::listing::parse_posts;
use crate::token::TokenSource;
use crate::{check_community, endpoint, read_json, DEFAULT_API_BASE, DEFAULT_USER_AGENT};

/// Authenticated client for the upstream content API.
///
/// Every request asks the [`TokenSource`] for a bearer token first. A 401
/// from the API invalidates the cached token so the next call renews it.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    api_base: String,
    user_agent: String,
    tokens: Arc<dyn TokenSource>,
}

impl UpstreamClient {
    pub fn new(tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            tokens,
        }
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// `GET /r/{community}/search`: raw listing JSON, untouched.
    pub async fn search_raw(
        &self,
        query: &SearchQuery,
        options: &SearchOptions,
    ) -> Result<serde_json::Value, ApiError> {
        if let Some(field) = query.missing_field() {
            return Err(ApiError::Validation(field));
        }

        let community = check_community(query.community_name())?;
        let url = endpoint(&self.api_base, &["r", community, "search"])?;
        let limit = options.effective_limit().to_string();
        debug!("upstream search {} sort={} t={} limit={}", query, options.sort, options.time, limit);

        let req = self.http.get(url).query(&[
            ("q", query.keyword_text()),
            ("sort", options.sort.as_str()),
            ("restrict_sr", "1"),
            ("t", options.time.as_str()),
            ("limit", limit.as_str()),
        ]);
        self.send(req).await
    }

    /// Search and normalize into posts, upstream order preserved.
    pub async fn search(
        &self,
        query: &SearchQuery,
        options: &SearchOptions,
    ) -> Result<Vec<Post>, ApiError> {
        parse_posts(self.search_raw(query, options).await?)
    }

    /// `GET /r/{community}/about`: community metadata as raw JSON.
    pub async fn about(&self, community: &str) -> Result<serde_json::Value, ApiError> {
        let query = SearchQuery::new(community, "");
        let name = check_community(query.community_name())?;
        let url = endpoint(&self.api_base, &["r", name, "about"])?;
        self.send(self.http.get(url)).await
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<serde_json::Value, ApiError> {
        let req = match self.tokens.token().await? {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        let resp = req
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let result = read_json(resp).await;
        if let Err(ref e) = result {
            if e.is_unauthorized() {
                warn!("upstream rejected the access token; invalidating");
                self.tokens.invalidate();
            }
        }
        result
    }
}
