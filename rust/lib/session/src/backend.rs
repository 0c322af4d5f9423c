use subsearch_client::{ApiError, RelayClient, UpstreamClient};
use subsearch_types::{Post, SearchOptions, SearchQuery};

use crate::executor::SearchBackend;

/// Direct: token from the client's token source, then the upstream API.
#[async_trait::async_trait]
impl SearchBackend for UpstreamClient {
    async fn search(
        &self,
        query: &SearchQuery,
        options: &SearchOptions,
    ) -> Result<Vec<Post>, ApiError> {
        UpstreamClient::search(self, query, options).await
    }
}

/// Via the relay, which holds the credentials.
#[async_trait::async_trait]
impl SearchBackend for RelayClient {
    async fn search(
        &self,
        query: &SearchQuery,
        options: &SearchOptions,
    ) -> Result<Vec<Post>, ApiError> {
        RelayClient::search(self, query, options).await
    }
}
