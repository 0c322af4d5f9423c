use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default refresh cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Repeating refresh timer bound to a session's lifetime.
///
/// Emits a tick on the channel returned by [`spawn`](Self::spawn) every
/// `interval`. [`restart`](Self::restart) pushes the next tick a full
/// interval out without firing. Cancelling the token stops the loop; no
/// ticks are sent afterwards.
#[derive(Clone)]
pub struct PollScheduler {
    reset_tx: mpsc::UnboundedSender<()>,
    cancel: CancellationToken,
    interval: Duration,
}

impl PollScheduler {
    pub fn spawn(
        interval: Duration,
        cancel: CancellationToken,
    ) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (reset_tx, mut reset_rx) = mpsc::unbounded_channel::<()>();
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            info!("poll scheduler started (interval={interval:?})");
            let timer = tokio::time::sleep(interval);
            tokio::pin!(timer);

            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => {
                        info!("poll scheduler stopped");
                        break;
                    }
                    msg = reset_rx.recv() => match msg {
                        Some(()) => timer.as_mut().reset(Instant::now() + interval),
                        None => break,
                    },
                    _ = &mut timer => {
                        debug!("poll tick");
                        if tick_tx.send(()).is_err() {
                            break;
                        }
                        timer.as_mut().reset(Instant::now() + interval);
                    }
                }
            }
        });

        (
            Self {
                reset_tx,
                cancel,
                interval,
            },
            tick_rx,
        )
    }

    /// Start a fresh full interval from now.
    pub fn restart(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        let _ = self.reset_tx.send(());
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<()>) -> usize {
        let mut n = 0;
        while rx.try_recv().is_ok() {
            n += 1;
        }
        n
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_on_fixed_interval() {
        let (_poll, mut ticks) = PollScheduler::spawn(DEFAULT_POLL_INTERVAL, CancellationToken::new());

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(drain(&mut ticks), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(drain(&mut ticks), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(drain(&mut ticks), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_pushes_next_tick_out_without_firing() {
        let (poll, mut ticks) = PollScheduler::spawn(DEFAULT_POLL_INTERVAL, CancellationToken::new());

        tokio::time::sleep(Duration::from_secs(50)).await;
        poll.restart();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(drain(&mut ticks), 0, "restart must not fire immediately");

        // Old deadline (60s) passes without a tick.
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(drain(&mut ticks), 0);

        // New deadline (110s) fires.
        tokio::time::sleep(Duration::from_secs(41)).await;
        assert_eq!(drain(&mut ticks), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_ticks() {
        let (poll, mut ticks) = PollScheduler::spawn(Duration::from_secs(1), CancellationToken::new());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(drain(&mut ticks), 1);

        poll.stop();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(drain(&mut ticks), 0);
        assert!(ticks.recv().await.is_none());
    }
}
