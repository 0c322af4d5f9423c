//! Upstream listing wire format and its normalization into [`Post`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subsearch_types::Post;

use crate::error::ApiError;

/// `{kind: "Listing", data: {...}}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub kind: Option<String>,
    pub data: ListingData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub dist: Option<u64>,
    pub children: Vec<Thing>,
}

/// `{kind: "t3", data: {...}}` wrapper around one item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thing {
    #[serde(default)]
    pub kind: Option<String>,
    pub data: RawPost,
}

/// One item exactly as upstream sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPost {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub author: String,
    pub created_utc: f64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: u64,
    pub permalink: String,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub is_self: Option<bool>,
    #[serde(default)]
    pub upvote_ratio: Option<f64>,
    #[serde(default)]
    pub stickied: Option<bool>,
}

impl From<RawPost> for Post {
    fn from(raw: RawPost) -> Self {
        Post {
            id: raw.id,
            title: raw.title,
            body: raw.selftext,
            author: raw.author,
            created_at: timestamp(raw.created_utc),
            score: raw.score,
            comment_count: raw.num_comments,
            permalink: raw.permalink,
            subreddit: raw.subreddit,
            url: raw.url,
            thumbnail: raw.thumbnail,
            is_self: raw.is_self,
            upvote_ratio: raw.upvote_ratio,
            stickied: raw.stickied.unwrap_or(false),
        }
    }
}

impl Listing {
    /// Normalize every child, preserving upstream order.
    pub fn into_posts(self) -> Vec<Post> {
        self.data.children.into_iter().map(|t| Post::from(t.data)).collect()
    }
}

/// Decode a listing payload into posts.
pub fn parse_posts(value: serde_json::Value) -> Result<Vec<Post>, ApiError> {
    let listing: Listing = serde_json::from_value(value)
        .map_err(|e| ApiError::Decode(format!("listing: {}", e)))?;
    Ok(listing.into_posts())
}

/// Float epoch seconds to UTC. Out-of-range values collapse to the epoch.
fn timestamp(secs: f64) -> DateTime<Utc> {
    if !secs.is_finite() {
        return DateTime::<Utc>::default();
    }
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
    DateTime::from_timestamp(whole, nanos).unwrap_or_default()
}
