//! Search-session controller.
//!
//! Turns a stream of raw input edits into debounced, sequenced searches and
//! keeps one observable [`SessionState`] per session:
//!
//! - [`Debouncer`] collapses keystroke bursts into one effective query.
//! - [`SearchExecutor`] runs a query against a [`SearchBackend`] and commits
//!   only if nothing newer was issued meanwhile.
//! - [`PollScheduler`] refreshes an unchanged query on a fixed interval.
//! - [`SearchSession`] wires them together and owns their lifetimes.

mod backend;
pub mod debounce;
pub mod executor;
pub mod poll;
pub mod session;
pub mod store;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use debounce::{Debouncer, DEFAULT_QUIET_PERIOD};
pub use executor::{Execution, SearchBackend, SearchExecutor, Trigger};
pub use poll::{PollScheduler, DEFAULT_POLL_INTERVAL};
pub use session::{SearchSession, SessionConfig};
pub use store::{ChangeHandler, SessionState, SessionStore, SubscriptionId};
pub use view::SessionView;
