use std::sync::Arc;
use std::time::Duration;

use subsearch_types::{SearchOptions, SearchQuery};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::debounce::{Debouncer, DEFAULT_QUIET_PERIOD};
use crate::executor::{SearchBackend, SearchExecutor, Trigger};
use crate::poll::{PollScheduler, DEFAULT_POLL_INTERVAL};
use crate::store::{SessionState, SessionStore, SubscriptionId};
use crate::view::SessionView;

/// Timing and request parameters for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Quiet period before typed input becomes the effective query.
    pub debounce: Duration,
    /// Refresh cadence for an unchanged effective query.
    pub poll_interval: Duration,
    /// Sort, time window and page size sent with every search.
    pub options: SearchOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_QUIET_PERIOD,
            poll_interval: DEFAULT_POLL_INTERVAL,
            options: SearchOptions::default(),
        }
    }
}

/// The search-session controller.
///
/// Wires keystrokes through the debouncer into searches, keeps results
/// fresh with the poll scheduler, and funnels every outcome into one
/// [`SessionStore`]. Background tasks live until [`close`](Self::close) or
/// drop.
///
/// # Example
///
/// ```ignore
/// let session = SearchSession::start(Arc::new(RelayClient::new(url)), SessionConfig::default());
/// session.subscribe(|state| render(&state.result));
/// session.input(SearchQuery::new("technology", "ai"));
/// ```
pub struct SearchSession {
    store: Arc<SessionStore>,
    debouncer: Debouncer,
    poll: PollScheduler,
    refresh_tx: mpsc::UnboundedSender<()>,
    cancel: CancellationToken,
    config: SessionConfig,
}

impl SearchSession {
    /// Start a session on the current Tokio runtime.
    pub fn start(backend: Arc<dyn SearchBackend>, config: SessionConfig) -> Self {
        let store = Arc::new(SessionStore::new());
        let cancel = CancellationToken::new();

        let (debouncer, mut effective_rx) =
            Debouncer::spawn(config.debounce, Arc::clone(&store), cancel.child_token());
        let (poll, mut ticks) = PollScheduler::spawn(config.poll_interval, cancel.child_token());
        let (refresh_tx, mut refresh_rx) = mpsc::unbounded_channel::<()>();
        let executor = SearchExecutor::new(backend, Arc::clone(&store), config.options);

        {
            let store = Arc::clone(&store);
            let poll = poll.clone();
            let cancel = cancel.clone();

            tokio::spawn(async move {
                info!("search session started");
                let mut published: Option<SearchQuery> = None;
                loop {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        Some(query) = effective_rx.recv() => {
                            poll.restart();
                            // Republishing the same search refreshes in place.
                            let trigger = match &published {
                                Some(prev) if prev.same_search(&query) => Trigger::Repeat,
                                _ => Trigger::Input,
                            };
                            published = Some(query.clone());
                            dispatch(&executor, query, trigger);
                        }
                        Some(()) = ticks.recv() => {
                            let query = store.snapshot().effective_query;
                            if query.is_executable() {
                                dispatch(&executor, query, Trigger::Poll);
                            } else {
                                debug!("poll tick skipped; no executable query");
                            }
                        }
                        Some(()) = refresh_rx.recv() => {
                            let query = store.snapshot().effective_query;
                            dispatch(&executor, query, Trigger::Manual);
                        }
                        else => break,
                    }
                }
                info!("search session stopped");
            });
        }

        Self {
            store,
            debouncer,
            poll,
            refresh_tx,
            cancel,
            config,
        }
    }

    /// Replace the whole raw input (both fields).
    pub fn input(&self, query: SearchQuery) {
        self.store.set_raw_input(query.clone());
        self.debouncer.input(query);
    }

    pub fn set_community(&self, community: impl Into<String>) {
        let community = community.into();
        let query = self.store.update_raw_input(|q| q.community = community);
        self.debouncer.input(query);
    }

    pub fn set_keyword(&self, keyword: impl Into<String>) {
        let keyword = keyword.into();
        let query = self.store.update_raw_input(|q| q.keyword = keyword);
        self.debouncer.input(query);
    }

    /// Re-run the current effective query now.
    pub fn refresh(&self) {
        if !self.cancel.is_cancelled() {
            let _ = self.refresh_tx.send(());
        }
    }

    pub fn state(&self) -> SessionState {
        self.store.snapshot()
    }

    pub fn view(&self) -> SessionView {
        self.store.view()
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        self.store.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.store.unsubscribe(id);
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Tear down: cancel timers, stop the driver, and freeze the state so
    /// in-flight searches can no longer write to it.
    pub fn close(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.debouncer.cancel();
        self.poll.stop();
        self.cancel.cancel();
        self.store.close();
        info!("search session closed");
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Take the ticket now, resolve in the background so input stays
/// responsive while the request is outstanding.
fn dispatch(executor: &SearchExecutor, query: SearchQuery, trigger: Trigger) {
    let execution = executor.issue(query, trigger);
    let executor = executor.clone();
    tokio::spawn(async move {
        executor.run(execution).await;
    });
}
