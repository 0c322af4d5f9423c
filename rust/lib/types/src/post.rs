use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Site root that permalinks are relative to.
pub const SITE_ROOT: &str = "https://www.reddit.com";

/// One search hit, snapshotted from upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    /// Self-text body; empty for link posts.
    pub body: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub score: i64,
    pub comment_count: u64,
    /// Site-relative path, e.g. `/r/rust/comments/abc/title/`.
    pub permalink: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subreddit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_self: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upvote_ratio: Option<f64>,
    #[serde(default)]
    pub stickied: bool,
}

impl Post {
    /// Absolute link to the post's discussion page.
    pub fn link(&self) -> String {
        if self.permalink.starts_with("http://") || self.permalink.starts_with("https://") {
            self.permalink.clone()
        } else {
            format!("{}{}", SITE_ROOT, self.permalink)
        }
    }
}
