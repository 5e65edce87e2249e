use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::core::lifecycle::LifecycleController;
use crate::model::Actor;

/// Fixed-interval refresh of one kind's working set, shared by every screen
/// showing that kind. Replaces the per-screen timers the old pages each ran.
///
/// The first tick fires immediately (initial load on mount); `trigger_now`
/// covers the visibility-regained case. Staleness between ticks is bounded by
/// the interval; the acting user's own transitions are reflected locally by
/// the controller and never wait for a poll.
pub struct PollScheduler {
    notify: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl PollScheduler {
    pub fn start(
        controller: Arc<LifecycleController>,
        actor: Actor,
        interval: Duration,
    ) -> Self {
        let notify = Arc::new(Notify::new());
        let wakeup = notify.clone();
        let handle = tokio::spawn(async move {
            let kind = controller.store().kind();
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = wakeup.notified() => {}
                }
                if let Err(e) = controller.refresh(&actor).await {
                    // Keep the last-known list on screen and try again next tick.
                    tracing::warn!(error = %e, kind = %kind, "Background refresh failed");
                }
            }
        });
        PollScheduler { notify, handle }
    }

    /// Forces a refresh outside the fixed cadence (tab regained visibility).
    pub fn trigger_now(&self) {
        self.notify.notify_one();
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
