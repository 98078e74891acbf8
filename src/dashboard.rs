//! The dashboard view: case list, sync poller and search debouncer for the
//! lifetime of one screen.
//!
//! DESIGN
//! ======
//! Background tasks (poll loop, debouncer) never touch dashboard state. They
//! send events over channels and [`Dashboard::next_event`] applies them on
//! the caller's task, one at a time. Fetches therefore never overlap, and a
//! refetch after a finished sync always uses the filters current at that
//! moment.
//!
//! Tearing down (explicitly via [`Dashboard::shutdown`] or by dropping the
//! dashboard) aborts both tasks.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::DashboardTimings;
use crate::net::types::{ApiError, SyncKind};
use crate::services::backend::DashboardBackend;
use crate::services::case_list::CaseListController;
use crate::services::debounce::Debouncer;
use crate::services::sync_poller::{SyncEvent, SyncPoller};
use crate::state::query::{InsuranceFilter, PageSize, QueryState, SortKey, TimeRange};
use crate::state::sync::{SyncPhase, SyncState};

/// A background event waiting to be applied.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    Sync(SyncEvent),
    /// Debounced search text.
    Search(String),
}

/// What changed after one call to [`Dashboard::next_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardUpdate {
    /// Debounced search text arrived; `reloaded` is false when it matched
    /// the active search.
    Search { reloaded: bool },
    /// A running sync reported progress.
    SyncProgress,
    /// The sync finished; a case refetch follows shortly.
    SyncFinished,
    /// The case list was reloaded after a finished sync.
    CasesRefetched,
    /// The dashboard was shut down.
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncStartError {
    #[error("Sync läuft bereits... Bitte warten Sie, bis die aktuelle Synchronisierung abgeschlossen ist.")]
    AlreadyRunning,
    #[error("Fehler beim Starten des Syncs: {0}")]
    Trigger(ApiError),
}

pub struct Dashboard {
    backend: Arc<dyn DashboardBackend>,
    cases: CaseListController,
    sync: SyncState,
    poller: SyncPoller,
    sync_events: mpsc::UnboundedReceiver<SyncEvent>,
    debouncer: Debouncer,
    search_terms: mpsc::UnboundedReceiver<String>,
    closed: bool,
}

impl Dashboard {
    /// Build the view and spawn its debouncer. Must be called inside a
    /// tokio runtime.
    #[must_use]
    pub fn new(backend: Arc<dyn DashboardBackend>, timings: DashboardTimings) -> Self {
        Self::with_query(backend, timings, QueryState::default())
    }

    /// Like [`Dashboard::new`], but the first fetch uses `query` as given,
    /// page and search included.
    #[must_use]
    pub fn with_query(backend: Arc<dyn DashboardBackend>, timings: DashboardTimings, query: QueryState) -> Self {
        let (poller, sync_events) = SyncPoller::new(backend.clone(), timings);
        let (debouncer, search_terms) = Debouncer::spawn(timings.search_debounce);
        Self {
            cases: CaseListController::with_query(backend.clone(), query),
            backend,
            sync: SyncState::default(),
            poller,
            sync_events,
            debouncer,
            search_terms,
            closed: false,
        }
    }

    #[must_use]
    pub fn cases(&self) -> &CaseListController {
        &self.cases
    }

    #[must_use]
    pub fn sync(&self) -> &SyncState {
        &self.sync
    }

    /// Initial load: pick up a sync that is already running, then fetch the
    /// current page.
    pub async fn mount(&mut self) {
        self.check_sync_status().await;
        self.cases.fetch().await;
    }

    /// Feed raw search input; it reaches the query after the quiet period.
    pub fn type_search(&self, text: &str) {
        if !self.debouncer.push(text) {
            debug!("search input after shutdown ignored");
        }
    }

    pub fn clear_search(&self) {
        self.type_search("");
    }

    /// Wait for the next background event without applying it.
    ///
    /// Cancel-safe: nothing is lost if the returned future is dropped, so
    /// this can sit in a `select!` next to other input sources. Returns
    /// `None` once the dashboard is shut down.
    pub async fn recv_event(&mut self) -> Option<DashboardEvent> {
        if self.closed {
            return None;
        }
        tokio::select! {
            Some(event) = self.sync_events.recv() => Some(DashboardEvent::Sync(event)),
            Some(term) = self.search_terms.recv() => Some(DashboardEvent::Search(term)),
            else => None,
        }
    }

    /// Apply one event received from [`Dashboard::recv_event`].
    pub async fn apply_event(&mut self, event: DashboardEvent) -> DashboardUpdate {
        match event {
            DashboardEvent::Sync(SyncEvent::Status(status)) => {
                self.sync.status = Some(status);
                self.sync.phase = SyncPhase::Polling;
                DashboardUpdate::SyncProgress
            }
            DashboardEvent::Sync(SyncEvent::Finished(status)) => {
                // A new sync may have started while the old one settled.
                if !self.poller.is_polling() {
                    self.sync.status = Some(status);
                    self.sync.phase = SyncPhase::Idle;
                }
                DashboardUpdate::SyncFinished
            }
            DashboardEvent::Sync(SyncEvent::RefetchCases) => {
                self.cases.fetch().await;
                DashboardUpdate::CasesRefetched
            }
            DashboardEvent::Search(term) => {
                let reloaded = self.apply_search(&term).await;
                DashboardUpdate::Search { reloaded }
            }
        }
    }

    /// Wait for the next background event and apply it.
    pub async fn next_event(&mut self) -> DashboardUpdate {
        match self.recv_event().await {
            Some(event) => self.apply_event(event).await,
            None => DashboardUpdate::Closed,
        }
    }

    /// Every fetch also looks at the sync status, so a sync started
    /// elsewhere shows up on the next filter or page change.
    async fn check_after_fetch(&mut self, fetched: bool) -> bool {
        if fetched {
            self.check_sync_status().await;
        }
        fetched
    }

    pub async fn set_insurance(&mut self, filter: InsuranceFilter) -> bool {
        let fetched = self.cases.set_insurance(filter).await;
        self.check_after_fetch(fetched).await
    }

    pub async fn set_page_size(&mut self, size: PageSize) -> bool {
        let fetched = self.cases.set_page_size(size).await;
        self.check_after_fetch(fetched).await
    }

    pub async fn toggle_sort(&mut self, key: SortKey) -> bool {
        let fetched = self.cases.toggle_sort(key).await;
        self.check_after_fetch(fetched).await
    }

    pub async fn set_show_active_only(&mut self, active_only: bool) -> bool {
        let fetched = self.cases.set_show_active_only(active_only).await;
        self.check_after_fetch(fetched).await
    }

    pub async fn set_time_range(&mut self, range: TimeRange) -> bool {
        let fetched = self.cases.set_time_range(range).await;
        self.check_after_fetch(fetched).await
    }

    pub async fn go_to_page(&mut self, page: u32) -> bool {
        let fetched = self.cases.go_to_page(page).await;
        self.check_after_fetch(fetched).await
    }

    /// Apply search text right away, bypassing the debouncer.
    pub async fn apply_search(&mut self, term: &str) -> bool {
        let fetched = self.cases.apply_search(term).await;
        self.check_after_fetch(fetched).await
    }

    /// Refetch the current page and re-check the sync status.
    pub async fn reload(&mut self) {
        self.cases.fetch().await;
        self.check_sync_status().await;
    }

    fn enter_polling(&mut self) {
        self.poller.ensure_polling();
        self.sync.phase = SyncPhase::Polling;
    }

    /// One status check. Starts polling for a running sync and finishes it
    /// when the backend reports idle, which schedules the usual refetch; a
    /// failed check changes nothing.
    pub async fn check_sync_status(&mut self) -> bool {
        match self.backend.get_sync_status().await {
            Ok(status) => {
                let running = status.is_running;
                if running {
                    self.sync.status = Some(status);
                    self.enter_polling();
                } else if self.poller.is_polling() {
                    self.sync.status = Some(status.clone());
                    self.sync.phase = SyncPhase::Idle;
                    self.poller.finish(status);
                } else {
                    self.sync.status = Some(status);
                }
                true
            }
            Err(e) => {
                warn!(error = %e, "sync status check failed");
                false
            }
        }
    }

    /// Show the latest progress without touching the polling state. The
    /// backend may not flag the new sync as running yet, so an idle answer
    /// here must not end polling.
    async fn refresh_displayed_status(&mut self) {
        match self.backend.get_sync_status().await {
            Ok(status) => self.sync.status = Some(status),
            Err(e) => debug!(error = %e, "status refresh after sync start failed"),
        }
    }

    /// Start a backend sync unless one is already running.
    ///
    /// # Errors
    ///
    /// Returns [`SyncStartError::AlreadyRunning`] when polling locally or the
    /// backend reports a running sync, and [`SyncStartError::Trigger`] when
    /// the backend refuses the request.
    pub async fn start_sync(&mut self, kind: SyncKind) -> Result<(), SyncStartError> {
        if self.poller.is_polling() {
            return Err(SyncStartError::AlreadyRunning);
        }

        match self.backend.get_sync_status().await {
            Ok(status) if status.is_running => {
                self.sync.status = Some(status);
                self.enter_polling();
                return Err(SyncStartError::AlreadyRunning);
            }
            Ok(status) => self.sync.status = Some(status),
            // Unknown backend state should not block the user.
            Err(e) => warn!(error = %e, "pre-sync status check failed; starting anyway"),
        }

        self.enter_polling();
        match self.backend.trigger_sync(kind).await {
            Ok(()) => {
                info!(kind = kind.label(), "sync started");
                self.refresh_displayed_status().await;
                Ok(())
            }
            Err(e) => {
                warn!(kind = kind.label(), error = %e, "sync trigger failed");
                self.poller.stop();
                self.sync.phase = SyncPhase::Idle;
                Err(SyncStartError::Trigger(e))
            }
        }
    }

    /// Stop polling and search debouncing. Later calls to
    /// [`Dashboard::next_event`] return [`DashboardUpdate::Closed`].
    pub fn shutdown(&mut self) {
        self.poller.stop();
        self.debouncer.stop();
        self.sync.phase = SyncPhase::Idle;
        self.closed = true;
        debug!("dashboard shut down");
    }
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;
