use std::sync::Arc;
use std::time::Duration;

use subsearch_types::SearchQuery;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::store::SessionStore;

/// Default quiet period before input becomes the effective query.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Coalesces bursts of input into one effective-query publish.
///
/// Every [`input`](Self::input) restarts the quiet-period timer. When the
/// timer runs out, the latest query is written to the store as the
/// effective query and sent on the channel returned by [`spawn`](Self::spawn).
/// Identical consecutive queries still republish.
pub struct Debouncer {
    tx: mpsc::UnboundedSender<SearchQuery>,
    cancel: CancellationToken,
}

impl Debouncer {
    /// Start the debounce loop. `cancel` tears it down; a publish that is
    /// still pending at that point is dropped.
    pub fn spawn(
        quiet: Duration,
        store: Arc<SessionStore>,
        cancel: CancellationToken,
    ) -> (Self, mpsc::UnboundedReceiver<SearchQuery>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<SearchQuery>();
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            debug!("debouncer started (quiet={quiet:?})");
            let mut pending: Option<SearchQuery> = None;
            let timer = tokio::time::sleep(quiet);
            tokio::pin!(timer);

            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => {
                        if pending.is_some() {
                            info!("debouncer stopped; pending publish dropped");
                        }
                        break;
                    }
                    msg = rx.recv() => match msg {
                        Some(query) => {
                            pending = Some(query);
                            timer.as_mut().reset(Instant::now() + quiet);
                        }
                        None => break,
                    },
                    _ = &mut timer, if pending.is_some() => {
                        if let Some(query) = pending.take() {
                            debug!("quiet period elapsed; effective query {}", query);
                            store.publish_effective(query.clone());
                            if out_tx.send(query).is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        });

        (Self { tx, cancel }, out_rx)
    }

    /// Note an input change; restarts the quiet period.
    pub fn input(&self, query: SearchQuery) {
        if self.cancel.is_cancelled() {
            return;
        }
        let _ = self.tx.send(query);
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}
