//! Scripted backends and fixtures for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::DateTime;
use subsearch_client::ApiError;
use subsearch_types::{Post, SearchOptions, SearchQuery};

use crate::executor::SearchBackend;

type Scripted = (Duration, Result<Vec<Post>, ApiError>);

/// Backend that answers per keyword with a canned response after a delay.
/// Unknown keywords resolve to an empty list.
pub(crate) struct ScriptedBackend {
    responses: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<SearchQuery>>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn respond(&self, keyword: &str, result: Result<Vec<Post>, ApiError>) {
        self.respond_after(keyword, Duration::ZERO, result);
    }

    pub(crate) fn respond_after(
        &self,
        keyword: &str,
        delay: Duration,
        result: Result<Vec<Post>, ApiError>,
    ) {
        self.responses.lock().unwrap().insert(keyword.to_string(), (delay, result));
    }

    pub(crate) fn calls(&self) -> Vec<SearchQuery> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl SearchBackend for ScriptedBackend {
    async fn search(
        &self,
        query: &SearchQuery,
        _options: &SearchOptions,
    ) -> Result<Vec<Post>, ApiError> {
        self.calls.lock().unwrap().push(query.clone());
        let (delay, result) = {
            let responses = self.responses.lock().unwrap();
            match responses.get(query.keyword_text()) {
                Some((delay, Ok(posts))) => (*delay, Ok(posts.clone())),
                Some((delay, Err(e))) => (*delay, Err(clone_error(e))),
                None => (Duration::ZERO, Ok(Vec::new())),
            }
        };
        tokio::time::sleep(delay).await;
        result
    }
}

// reqwest::Error is not Clone; scripted errors never use that variant.
fn clone_error(e: &ApiError) -> ApiError {
    match e {
        ApiError::Auth(m) => ApiError::Auth(m.clone()),
        ApiError::Upstream { status, message } => ApiError::Upstream {
            status: *status,
            message: message.clone(),
        },
        ApiError::Decode(m) => ApiError::Decode(m.clone()),
        ApiError::Validation(f) => ApiError::Validation(*f),
        ApiError::InvalidCommunity(n) => ApiError::InvalidCommunity(n.clone()),
        ApiError::BaseUrl(u) => ApiError::BaseUrl(u.clone()),
        ApiError::Transport(t) => ApiError::Decode(t.to_string()),
    }
}

pub(crate) fn post(id: &str, title: &str) -> Post {
    Post {
        id: id.into(),
        title: title.into(),
        body: String::new(),
        author: "tester".into(),
        created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
        score: 1,
        comment_count: 0,
        permalink: format!("/r/test/comments/{}/", id),
        subreddit: Some("test".into()),
        url: None,
        thumbnail: None,
        is_self: Some(true),
        upvote_ratio: None,
        stickied: false,
    }
}
