use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Upper bound the upstream listing endpoint accepts for `limit`.
pub const MAX_LIMIT: u32 = 100;

/// Default page size.
pub const DEFAULT_LIMIT: u32 = 25;

/// Sort order for search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSort {
    #[default]
    New,
    Hot,
    Top,
    Relevance,
}

impl SearchSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchSort::New => "new",
            SearchSort::Hot => "hot",
            SearchSort::Top => "top",
            SearchSort::Relevance => "relevance",
        }
    }
}

impl fmt::Display for SearchSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "new" => Ok(SearchSort::New),
            "hot" => Ok(SearchSort::Hot),
            "top" => Ok(SearchSort::Top),
            "relevance" => Ok(SearchSort::Relevance),
            other => Err(format!("unknown sort '{}'", other)),
        }
    }
}

/// Time window for search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFilter {
    Hour,
    Day,
    Week,
    Month,
    Year,
    #[default]
    All,
}

impl TimeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilter::Hour => "hour",
            TimeFilter::Day => "day",
            TimeFilter::Week => "week",
            TimeFilter::Month => "month",
            TimeFilter::Year => "year",
            TimeFilter::All => "all",
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hour" => Ok(TimeFilter::Hour),
            "day" => Ok(TimeFilter::Day),
            "week" => Ok(TimeFilter::Week),
            "month" => Ok(TimeFilter::Month),
            "year" => Ok(TimeFilter::Year),
            "all" => Ok(TimeFilter::All),
            other => Err(format!("unknown time filter '{}'", other)),
        }
    }
}

/// Fixed request parameters sent alongside the keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub sort: SearchSort,
    pub time: TimeFilter,
    pub limit: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            sort: SearchSort::New,
            time: TimeFilter::All,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl SearchOptions {
    /// Limit clamped into `1..=MAX_LIMIT`.
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_LIMIT)
    }
}
