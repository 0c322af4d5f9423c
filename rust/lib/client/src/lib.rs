//! HTTP clients for community keyword search.
//!
//! Two ways to reach the content API:
//!
//! - [`UpstreamClient`] talks to the API directly and authenticates every
//!   request through a pluggable [`TokenSource`]. Only server-side code
//!   (the relay) should hold the client credentials this needs.
//! - [`RelayClient`] talks to the relay, which attaches the token itself.
//!
//! # Usage
//!
//! ```ignore
//! use subsearch_client::{ClientCredentials, UpstreamClient};
//!
//! let tokens = Arc::new(ClientCredentials::new(client_id, client_secret));
//! let upstream = UpstreamClient::new(tokens);
//! let posts = upstream.search(&query, &SearchOptions::default()).await?;
//! ```

pub mod error;
pub mod listing;
pub mod relay;
pub mod token;
pub mod upstream;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{extract_message, ApiError, FALLBACK_REASON};
pub use listing::{parse_posts, Listing, RawPost};
pub use relay::RelayClient;
pub use token::{ClientCredentials, NoAuth, StaticToken, TokenSource};
pub use upstream::UpstreamClient;

/// Token host.
pub const DEFAULT_AUTH_BASE: &str = "https://www.reddit.com";

/// Authenticated API host.
pub const DEFAULT_API_BASE: &str = "https://oauth.reddit.com";

pub const DEFAULT_USER_AGENT: &str = concat!("subsearch/", env!("CARGO_PKG_VERSION"));

/// Check that `name` is a bare community name: one or more of `[A-Za-z0-9_]`.
pub fn check_community(name: &str) -> Result<&str, ApiError> {
    if name.is_empty() {
        return Err(ApiError::Validation("community"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ApiError::InvalidCommunity(name.to_string()));
    }
    Ok(name)
}

/// `base` followed by `segments`, each appended as one percent-encoded path
/// segment. Nothing in a segment can climb out of or end the path.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<reqwest::Url, ApiError> {
    let mut url = reqwest::Url::parse(base).map_err(|_| ApiError::BaseUrl(base.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::BaseUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Parse an API response, mapping HTTP errors to `ApiError`.
pub(crate) async fn read_json(resp: reqwest::Response) -> Result<serde_json::Value, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        let code = status.as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Upstream {
            status: code,
            message: extract_message(&body),
        });
    }
    resp.json::<serde_json::Value>()
        .await
        .map_err(|e| ApiError::Decode(format!("response body: {}", e)))
}
