use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use subsearch_types::{ResultState, SearchQuery};
use tracing::debug;

use crate::view::SessionView;

/// Everything the view can observe about one search session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// What the user has typed so far, updated on every keystroke.
    pub raw_input: SearchQuery,
    /// The debounced query that fetches are made for.
    pub effective_query: SearchQuery,
    /// Outcome of the most recent execution.
    pub result: ResultState,
}

/// Callback type for state change notifications.
pub type ChangeHandler = Arc<dyn Fn(&SessionState) + Send + Sync>;

/// Unique handle for a subscription, returned by `SessionStore::subscribe()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Session state with change notifications.
///
/// Each field has exactly one writer: the controller sets `raw_input`,
/// the debouncer publishes `effective_query`, and the executor replaces
/// `result`. Result writes are sequenced: [`begin`](Self::begin) issues a
/// ticket, and only the newest ticket may [`commit`](Self::commit).
///
/// Handlers run on the writer's thread, one notification at a time, in
/// the order the writes happened. A snapshot older than one already
/// delivered is dropped. Handlers must not write back into the session.
pub struct SessionStore {
    inner: RwLock<Inner>,
    handlers: RwLock<Vec<HandlerEntry>>,
    /// Version of the last snapshot handed to handlers.
    delivered: Mutex<u64>,
    /// Monotonic counter for subscription IDs.
    next_id: AtomicU64,
}

struct Inner {
    state: SessionState,
    /// Sequence number of the most recently issued execution.
    latest_seq: u64,
    /// Bumped on every applied write.
    version: u64,
    closed: bool,
}

#[derive(Clone)]
struct HandlerEntry {
    id: SubscriptionId,
    handler: ChangeHandler,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                state: SessionState::default(),
                latest_seq: 0,
                version: 0,
                closed: false,
            }),
            handlers: RwLock::new(Vec::new()),
            delivered: Mutex::new(0),
            next_id: AtomicU64::new(1),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.read().state.clone()
    }

    /// The slice of state the presentation layer renders.
    pub fn view(&self) -> SessionView {
        SessionView::from(&self.read().state)
    }

    pub fn is_closed(&self) -> bool {
        self.read().closed
    }

    /// Sequence number of the newest execution issued so far.
    pub fn latest_seq(&self) -> u64 {
        self.read().latest_seq
    }

    /// Register a change handler, called synchronously with a full snapshot
    /// after every mutation.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = HandlerEntry {
            id,
            handler: Arc::new(handler),
        };
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|entry| entry.id != id);
    }

    // ====================================================================
    // Writers
    // ====================================================================

    /// Record the latest keystroke state.
    pub(crate) fn set_raw_input(&self, query: SearchQuery) {
        self.mutate(|state| {
            state.raw_input = query;
            true
        });
    }

    /// Apply `edit` to the raw input and return the result.
    pub(crate) fn update_raw_input<F>(&self, edit: F) -> SearchQuery
    where
        F: FnOnce(&mut SearchQuery),
    {
        let mut updated = SearchQuery::default();
        self.mutate(|state| {
            edit(&mut state.raw_input);
            updated = state.raw_input.clone();
            true
        });
        updated
    }

    /// Publish a new effective query.
    pub(crate) fn publish_effective(&self, query: SearchQuery) {
        self.mutate(|state| {
            state.effective_query = query;
            true
        });
    }

    /// Issue the next execution ticket. Any ticket issued earlier can no
    /// longer commit. With `loading`, the result is replaced by `Loading`
    /// right away.
    pub(crate) fn begin(&self, loading: bool) -> u64 {
        let (seq, snapshot) = {
            let mut inner = self.write();
            inner.latest_seq += 1;
            let seq = inner.latest_seq;
            if loading && !inner.closed {
                inner.state.result = ResultState::Loading;
                (seq, Some(inner.stamp()))
            } else {
                (seq, None)
            }
        };
        if let Some((version, state)) = snapshot {
            self.notify(version, &state);
        }
        seq
    }

    /// Replace the result wholesale, if `seq` is still the newest ticket
    /// and the session is open. Returns whether the write happened.
    pub(crate) fn commit(&self, seq: u64, result: ResultState) -> bool {
        let snapshot = {
            let mut inner = self.write();
            if inner.closed {
                debug!("session closed; discarding result #{}", seq);
                return false;
            }
            if seq != inner.latest_seq {
                debug!("result #{} superseded by #{}; discarding", seq, inner.latest_seq);
                return false;
            }
            inner.state.result = result;
            inner.stamp()
        };
        self.notify(snapshot.0, &snapshot.1);
        true
    }

    /// Freeze the state; all later writes are ignored.
    pub(crate) fn close(&self) {
        self.write().closed = true;
    }

    fn mutate<F>(&self, apply: F)
    where
        F: FnOnce(&mut SessionState) -> bool,
    {
        let snapshot = {
            let mut inner = self.write();
            if inner.closed || !apply(&mut inner.state) {
                return;
            }
            inner.stamp()
        };
        self.notify(snapshot.0, &snapshot.1);
    }

    fn notify(&self, version: u64, state: &SessionState) {
        let mut delivered = self.delivered.lock().unwrap_or_else(PoisonError::into_inner);
        if version <= *delivered {
            debug!("snapshot v{} overtaken by v{}; not delivered", version, *delivered);
            return;
        }
        *delivered = version;
        // Clone the list so handlers may (un)subscribe without deadlocking.
        let handlers: Vec<HandlerEntry> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for entry in handlers {
            (entry.handler)(state);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    /// Bump the version and return it with a copy of the state.
    fn stamp(&mut self) -> (u64, SessionState) {
        self.version += 1;
        (self.version, self.state.clone())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
