use std::fmt;
use std::sync::Arc;

use subsearch_client::ApiError;
use subsearch_types::{Post, ResultState, SearchOptions, SearchQuery};
use tracing::{debug, info, warn};

use crate::store::SessionStore;

/// Where search results come from.
///
/// Implemented for the direct upstream client (token manager + API) and for
/// the relay client; tests plug in scripted backends.
#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync + 'static {
    async fn search(
        &self,
        query: &SearchQuery,
        options: &SearchOptions,
    ) -> Result<Vec<Post>, ApiError>;
}

/// What caused an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A new effective query was published.
    Input,
    /// The poll scheduler fired.
    Poll,
    /// An explicit refresh request.
    Manual,
    /// The unchanged effective query was published again.
    Repeat,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trigger::Input => "input",
            Trigger::Poll => "poll",
            Trigger::Manual => "manual",
            Trigger::Repeat => "repeat",
        })
    }
}

/// Runs one query against the backend and writes the classified outcome
/// into the store.
///
/// Each execution takes a ticket from the store before awaiting the
/// backend; if a newer execution is issued meanwhile, this one's outcome is
/// dropped instead of written.
#[derive(Clone)]
pub struct SearchExecutor {
    backend: Arc<dyn SearchBackend>,
    store: Arc<SessionStore>,
    options: SearchOptions,
}

impl SearchExecutor {
    pub fn new(backend: Arc<dyn SearchBackend>, store: Arc<SessionStore>, options: SearchOptions) -> Self {
        Self {
            backend,
            store,
            options,
        }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Issue an execution for `query`. The ticket is taken immediately, so
    /// anything issued earlier can no longer commit, even if it is still
    /// waiting on the backend.
    pub fn issue(&self, query: SearchQuery, trigger: Trigger) -> Execution {
        let loading = trigger == Trigger::Input && query.is_executable();
        let seq = self.store.begin(loading);
        Execution { seq, query, trigger }
    }

    /// Run an issued execution and return its classified outcome.
    ///
    /// An inert query (blank community or keyword) resolves to `Idle`
    /// without touching the backend. The returned state is what this
    /// execution produced, whether or not it was allowed to commit.
    pub async fn run(&self, execution: Execution) -> ResultState {
        let Execution { seq, query, trigger } = execution;

        if !query.is_executable() {
            self.store.commit(seq, ResultState::Idle);
            debug!("inert query ({}); result cleared", trigger);
            return ResultState::Idle;
        }

        info!("search #{} {} ({})", seq, query, trigger);
        let outcome = match self.backend.search(&query, &self.options).await {
            Ok(posts) => ResultState::from_posts(posts),
            Err(e) => {
                warn!("search #{} failed: {}", seq, e);
                ResultState::Failed(e.reason())
            }
        };

        if self.store.commit(seq, outcome.clone()) {
            debug!("search #{} committed: {}", seq, describe(&outcome));
        }
        outcome
    }

    /// Issue and run in one step.
    pub async fn execute(&self, query: SearchQuery, trigger: Trigger) -> ResultState {
        let execution = self.issue(query, trigger);
        self.run(execution).await
    }
}

/// A ticketed, not yet resolved execution.
#[derive(Debug, Clone)]
pub struct Execution {
    seq: u64,
    query: SearchQuery,
    trigger: Trigger,
}

impl Execution {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger
    }
}

fn describe(state: &ResultState) -> String {
    match state {
        ResultState::Idle => "idle".into(),
        ResultState::Loading => "loading".into(),
        ResultState::Populated(posts) => format!("{} posts", posts.len()),
        ResultState::Empty => "empty".into(),
        ResultState::Failed(reason) => format!("failed: {}", reason),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::testing::{post, ScriptedBackend};

    fn executor(backend: Arc<ScriptedBackend>) -> (SearchExecutor, Arc<SessionStore>) {
        let store = Arc::new(SessionStore::new());
        (SearchExecutor::new(backend, store.clone(), SearchOptions::default()), store)
    }

    #[tokio::test]
    async fn inert_query_clears_without_backend_call() {
        let backend = ScriptedBackend::new();
        let (exec, store) = executor(backend.clone());

        for q in [
            SearchQuery::new("", "ai"),
            SearchQuery::new("technology", ""),
            SearchQuery::new("  ", "  "),
        ] {
            assert_eq!(exec.execute(q, Trigger::Input).await, ResultState::Idle);
        }
        assert_eq!(backend.call_count(), 0);
        assert_eq!(store.snapshot().result, ResultState::Idle);
    }

    #[tokio::test]
    async fn populated_preserves_upstream_order() {
        let backend = ScriptedBackend::new();
        backend.respond("ai", Ok(vec![post("2", "newer"), post("1", "older")]));
        let (exec, store) = executor(backend.clone());

        let outcome = exec.execute(SearchQuery::new("technology", "ai"), Trigger::Input).await;

        let ResultState::Populated(posts) = &outcome else {
            panic!("expected populated, got {:?}", outcome);
        };
        assert_eq!(posts.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), ["2", "1"]);
        assert_eq!(store.snapshot().result, outcome);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn zero_items_is_empty() {
        let backend = ScriptedBackend::new();
        backend.respond("nothing", Ok(vec![]));
        let (exec, store) = executor(backend);

        exec.execute(SearchQuery::new("technology", "nothing"), Trigger::Input).await;
        assert_eq!(store.snapshot().result, ResultState::Empty);
    }

    #[tokio::test]
    async fn failure_carries_most_specific_reason() {
        let backend = ScriptedBackend::new();
        backend.respond(
            "forbidden",
            Err(ApiError::Upstream { status: 403, message: Some("Forbidden".into()) }),
        );
        backend.respond("opaque", Err(ApiError::Upstream { status: 500, message: None }));
        let (exec, store) = executor(backend);

        exec.execute(SearchQuery::new("x", "forbidden"), Trigger::Input).await;
        assert_eq!(store.snapshot().result, ResultState::Failed("Forbidden".into()));

        exec.execute(SearchQuery::new("x", "opaque"), Trigger::Input).await;
        assert_eq!(
            store.snapshot().result,
            ResultState::Failed("Failed to fetch search results (HTTP 500)".into())
        );
    }

    #[tokio::test]
    async fn same_query_twice_is_identical() {
        let backend = ScriptedBackend::new();
        backend.respond("ai", Ok(vec![post("1", "a"), post("2", "b")]));
        let (exec, _) = executor(backend);

        let q = SearchQuery::new("technology", "ai");
        let first = exec.execute(q.clone(), Trigger::Input).await;
        let second = exec.execute(q, Trigger::Poll).await;
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn late_result_of_superseded_query_is_dropped() {
        let backend = ScriptedBackend::new();
        backend.respond_after("slow", Duration::from_millis(500), Ok(vec![post("a", "A")]));
        backend.respond_after("fast", Duration::from_millis(10), Ok(vec![post("b", "B")]));
        let (exec, store) = executor(backend);

        let a = tokio::spawn({
            let exec = exec.clone();
            async move { exec.execute(SearchQuery::new("x", "slow"), Trigger::Input).await }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;
        let b = exec.execute(SearchQuery::new("x", "fast"), Trigger::Input).await;
        assert_eq!(store.snapshot().result, b);

        // A resolves after B already wrote; it must not overwrite.
        let a = a.await.unwrap();
        assert!(matches!(a, ResultState::Populated(_)));
        assert_eq!(store.snapshot().result.posts()[0].id, "b");
    }

    #[tokio::test(start_paused = true)]
    async fn poll_refresh_keeps_results_visible() {
        let backend = ScriptedBackend::new();
        backend.respond_after("ai", Duration::from_millis(100), Ok(vec![post("1", "a")]));
        let (exec, store) = executor(backend);
        let q = SearchQuery::new("technology", "ai");

        exec.execute(q.clone(), Trigger::Input).await;

        let loading_seen = Arc::new(AtomicU64::new(0));
        let seen = loading_seen.clone();
        store.subscribe(move |s| {
            if s.result.is_loading() {
                seen.fetch_add(1, Ordering::Relaxed);
            }
        });

        exec.execute(q.clone(), Trigger::Poll).await;
        assert_eq!(loading_seen.load(Ordering::Relaxed), 0);

        exec.execute(q, Trigger::Input).await;
        assert_eq!(loading_seen.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn issue_order_decides_the_winner() {
        let backend = ScriptedBackend::new();
        backend.respond("old", Ok(vec![post("old", "old")]));
        backend.respond("new", Ok(vec![post("new", "new")]));
        let (exec, store) = executor(backend);

        let older = exec.issue(SearchQuery::new("x", "old"), Trigger::Input);
        let newer = exec.issue(SearchQuery::new("x", "new"), Trigger::Poll);
        assert!(newer.seq() > older.seq());
        assert_eq!(newer.trigger(), Trigger::Poll);

        // Newer runs first; the older one then resolves and is discarded.
        exec.run(newer).await;
        exec.run(older).await;
        assert_eq!(store.snapshot().result.posts()[0].id, "new");
    }

    #[tokio::test(start_paused = true)]
    async fn inert_query_supersedes_in_flight_search() {
        let backend = ScriptedBackend::new();
        backend.respond_after("slow", Duration::from_millis(500), Ok(vec![post("a", "A")]));
        let (exec, store) = executor(backend);

        let pending = tokio::spawn({
            let exec = exec.clone();
            async move { exec.execute(SearchQuery::new("x", "slow"), Trigger::Input).await }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;
        exec.execute(SearchQuery::new("x", ""), Trigger::Input).await;
        pending.await.unwrap();

        assert_eq!(store.snapshot().result, ResultState::Idle);
    }
}
