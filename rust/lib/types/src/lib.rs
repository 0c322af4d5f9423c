//! Shared value types for community keyword search.
//!
//! Everything here is a plain value: no I/O, no interior mutability.
//! The client crate produces these, the session crate stores them, and the
//! front-ends render them.

pub mod credential;
pub mod options;
pub mod post;
pub mod query;
pub mod result;

pub use credential::Credential;
pub use options::{SearchOptions, SearchSort, TimeFilter};
pub use post::Post;
pub use query::SearchQuery;
pub use result::ResultState;
