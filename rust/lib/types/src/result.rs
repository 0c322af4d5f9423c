use serde::{Deserialize, Serialize};

use crate::post::Post;

/// Outcome of the latest search, as the view sees it.
///
/// A single tagged value rather than independent `loading`/`error`/`items`
/// fields, so "loading with an error" cannot be represented.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum ResultState {
    /// No executable query yet, or the query was cleared.
    #[default]
    Idle,
    Loading,
    /// At least one post, in upstream order.
    Populated(Vec<Post>),
    /// Well-formed response with zero items.
    Empty,
    /// Single-line user-facing reason.
    Failed(String),
}

impl ResultState {
    /// Classify a successful fetch.
    pub fn from_posts(posts: Vec<Post>) -> Self {
        if posts.is_empty() {
            ResultState::Empty
        } else {
            ResultState::Populated(posts)
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ResultState::Loading)
    }

    pub fn posts(&self) -> &[Post] {
        match self {
            ResultState::Populated(posts) => posts,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ResultState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}
