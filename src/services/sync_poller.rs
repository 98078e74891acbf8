//! Sync status poller.
//!
//! DESIGN
//! ======
//! While a backend sync is running, a background task asks for the sync
//! status on a fixed interval and forwards every report as a [`SyncEvent`].
//! When the backend reports idle the task sends [`SyncEvent::Finished`],
//! waits for the refetch delay so backend writes settle, sends exactly one
//! [`SyncEvent::RefetchCases`] and exits.
//!
//! The poller owns the only interval task. Starting while already polling is
//! a no-op; stopping or dropping the poller aborts the task, so no status
//! call happens after teardown. An idle report that arrives outside the task
//! (a manual status check) goes through [`SyncPoller::finish`], which runs
//! the same finish sequence.
//!
//! ERROR HANDLING
//! ==============
//! A failed status check is logged and skipped. The last reported status
//! stays on screen and polling continues on the next tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::backend::DashboardBackend;
use crate::config::DashboardTimings;
use crate::net::types::SyncStatus;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A running sync reported progress.
    Status(SyncStatus),
    /// The backend reported idle; polling has stopped.
    Finished(SyncStatus),
    /// The case list should be reloaded.
    RefetchCases,
}

pub struct SyncPoller {
    backend: Arc<dyn DashboardBackend>,
    period: Duration,
    refetch_delay: Duration,
    events: mpsc::UnboundedSender<SyncEvent>,
    /// Cleared by the task itself the moment it sees the backend go idle.
    active: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
    /// A finished task still waiting to send its refetch.
    settling: Option<JoinHandle<()>>,
}

impl SyncPoller {
    #[must_use]
    pub fn new(
        backend: Arc<dyn DashboardBackend>,
        timings: DashboardTimings,
    ) -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let poller = Self {
            backend,
            period: timings.sync_poll,
            refetch_delay: timings.refetch_delay,
            events,
            active: Arc::new(AtomicBool::new(false)),
            task: None,
            settling: None,
        };
        (poller, events_rx)
    }

    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.active.load(Ordering::SeqCst) && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start polling unless already polling. Returns `true` if a task was spawned.
    ///
    /// The first status check happens one period from now.
    pub fn ensure_polling(&mut self) -> bool {
        if self.is_polling() {
            return false;
        }

        if let Some(previous) = self.task.take().filter(|task| !task.is_finished()) {
            if let Some(older) = self.settling.replace(previous) {
                older.abort();
            }
        }

        let active = Arc::new(AtomicBool::new(true));
        self.active = active.clone();
        self.task = Some(tokio::spawn(poll_loop(
            self.backend.clone(),
            self.period,
            self.refetch_delay,
            self.events.clone(),
            active,
        )));
        debug!(period_ms = self.period.as_millis(), "sync polling started");
        true
    }

    /// End polling because a status check outside the interval task saw the
    /// backend go idle. Sends [`SyncEvent::Finished`] and, after the refetch
    /// delay, one [`SyncEvent::RefetchCases`].
    pub fn finish(&mut self, status: SyncStatus) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let handle = tokio::spawn(settle(status, self.refetch_delay, self.events.clone()));
        if let Some(older) = self.settling.replace(handle) {
            older.abort();
        }
        debug!("sync polling finished by status check");
    }

    /// Abort polling and any pending refetch.
    pub fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        let mut stopped = false;
        for task in [self.task.take(), self.settling.take()].into_iter().flatten() {
            stopped |= !task.is_finished();
            task.abort();
        }
        if stopped {
            debug!("sync polling stopped");
        }
    }
}

impl Drop for SyncPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    backend: Arc<dyn DashboardBackend>,
    period: Duration,
    refetch_delay: Duration,
    events: mpsc::UnboundedSender<SyncEvent>,
    active: Arc<AtomicBool>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match backend.get_sync_status().await {
            Ok(status) if status.is_running => {
                debug!(
                    processed = status.stats.processed,
                    total = status.stats.total_cases,
                    "sync progress"
                );
                if events.send(SyncEvent::Status(status)).is_err() {
                    return;
                }
            }
            Ok(status) => {
                active.store(false, Ordering::SeqCst);
                settle(status, refetch_delay, events).await;
                return;
            }
            Err(e) => warn!(error = %e, "sync status check failed"),
        }
    }
}

/// Report the finished sync, let backend writes settle, then ask for one refetch.
async fn settle(status: SyncStatus, refetch_delay: Duration, events: mpsc::UnboundedSender<SyncEvent>) {
    info!(
        upserted = status.stats.upserted,
        errors = status.stats.errors,
        "sync finished"
    );
    if events.send(SyncEvent::Finished(status)).is_err() {
        return;
    }
    tokio::time::sleep(refetch_delay).await;
    if events.send(SyncEvent::RefetchCases).is_err() {
        debug!("refetch dropped; dashboard gone");
    }
}

#[cfg(test)]
#[path = "sync_poller_test.rs"]
mod tests;
