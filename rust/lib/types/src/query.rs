use std::fmt;

use serde::{Deserialize, Serialize};

/// A community + keyword pair as typed by the user.
///
/// Both fields must be non-blank for the query to be executable; otherwise
/// the query is inert and never reaches the network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchQuery {
    pub community: String,
    pub keyword: String,
}

impl SearchQuery {
    pub fn new(community: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            community: community.into(),
            keyword: keyword.into(),
        }
    }

    /// Community name with surrounding whitespace and an optional `r/`
    /// prefix removed.
    pub fn community_name(&self) -> &str {
        let name = self.community.trim();
        name.strip_prefix("r/")
            .or_else(|| name.strip_prefix("/r/"))
            .unwrap_or(name)
            .trim()
    }

    /// Keyword with surrounding whitespace removed.
    pub fn keyword_text(&self) -> &str {
        self.keyword.trim()
    }

    /// True when both fields carry something to search for.
    pub fn is_executable(&self) -> bool {
        !self.community_name().is_empty() && !self.keyword_text().is_empty()
    }

    /// True when both queries would send the same request.
    pub fn same_search(&self, other: &SearchQuery) -> bool {
        self.community_name() == other.community_name() && self.keyword_text() == other.keyword_text()
    }

    /// Name of the first missing field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.community_name().is_empty() {
            Some("community")
        } else if self.keyword_text().is_empty() {
            Some("keyword")
        } else {
            None
        }
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r/{} \"{}\"", self.community_name(), self.keyword_text())
    }
}
