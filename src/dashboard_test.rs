use super::*;
use crate::net::types::SyncStatus;
use crate::services::test_helpers::{MockBackend, case, idle, page, running};

use std::time::Duration;

use tokio::time::{Instant, sleep, timeout};

fn timings() -> DashboardTimings {
    DashboardTimings {
        sync_poll: Duration::from_secs(2),
        refetch_delay: Duration::from_secs(1),
        search_debounce: Duration::from_millis(300),
    }
}

fn dashboard() -> (Arc<MockBackend>, Dashboard) {
    let backend = Arc::new(MockBackend::new());
    let dash = Dashboard::new(backend.clone(), timings());
    (backend, dash)
}

// =============================================================================
// mount
// =============================================================================

#[tokio::test(start_paused = true)]
async fn mount_checks_status_then_fetches() {
    let (backend, mut dash) = dashboard();
    backend.push_page(Ok(page(vec![case("1", Some("Haspa"))], 1, 1, 50)));

    dash.mount().await;

    assert_eq!(backend.status_calls(), 1);
    assert_eq!(backend.case_fetches(), 1);
    assert!(!dash.sync().is_polling());
    assert_eq!(dash.cases().status_message(), "1 aktive Fall");
}

#[tokio::test(start_paused = true)]
async fn running_sync_finishes_with_exactly_one_refetch() {
    let (backend, mut dash) = dashboard();
    backend.push_status(Ok(running(1, 10)));
    backend.push_status(Ok(running(6, 10)));
    backend.push_status(Ok(idle()));

    dash.mount().await;
    assert!(dash.sync().is_polling());
    let start = Instant::now();

    assert_eq!(dash.next_event().await, DashboardUpdate::SyncProgress);
    assert_eq!(dash.sync().status, Some(running(6, 10)));
    assert_eq!(dash.next_event().await, DashboardUpdate::SyncFinished);
    assert!(!dash.sync().is_running());
    let finished_at = start.elapsed();

    assert_eq!(dash.next_event().await, DashboardUpdate::CasesRefetched);
    assert_eq!(start.elapsed() - finished_at, Duration::from_secs(1));
    assert_eq!(backend.case_fetches(), 2);

    assert!(timeout(Duration::from_secs(30), dash.next_event()).await.is_err());
    assert_eq!(backend.case_fetches(), 2);
    assert_eq!(backend.status_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn refetch_after_sync_uses_current_filters() {
    let (backend, mut dash) = dashboard();
    backend.push_status(Ok(running(1, 10)));
    backend.push_status(Ok(running(5, 10)));
    backend.push_status(Ok(idle()));

    dash.mount().await;
    dash.set_time_range(TimeRange::LastYear).await;
    assert!(dash.sync().is_polling());

    assert_eq!(dash.next_event().await, DashboardUpdate::SyncFinished);
    assert_eq!(dash.next_event().await, DashboardUpdate::CasesRefetched);
    assert_eq!(backend.last_query().time_range_months, Some(12));
}

#[tokio::test(start_paused = true)]
async fn failed_status_check_keeps_displayed_status() {
    let (backend, mut dash) = dashboard();
    backend.push_status(Ok(running(4, 10)));
    backend.push_status(Err(ApiError::Network("timeout".into())));
    backend.push_status(Ok(idle()));

    dash.mount().await;
    assert!(timeout(Duration::from_secs(3), dash.next_event()).await.is_err());
    assert_eq!(backend.status_calls(), 2);
    assert_eq!(dash.sync().status, Some(running(4, 10)));
    assert!(dash.sync().is_polling());

    assert_eq!(dash.next_event().await, DashboardUpdate::SyncFinished);
}

#[tokio::test(start_paused = true)]
async fn failed_manual_check_changes_nothing() {
    let (backend, mut dash) = dashboard();
    backend.push_status(Ok(running(2, 10)));
    backend.push_status(Err(ApiError::Status { status: 503, message: "Service Unavailable".into() }));

    assert!(dash.check_sync_status().await);
    assert!(!dash.check_sync_status().await);
    assert_eq!(dash.sync().status, Some(running(2, 10)));
    assert!(dash.sync().is_polling());
}

#[tokio::test(start_paused = true)]
async fn idle_report_from_manual_check_refetches_once() {
    let (backend, mut dash) = dashboard();
    backend.push_status(Ok(running(2, 10)));
    backend.push_status(Ok(idle()));

    dash.mount().await;
    assert!(dash.sync().is_polling());
    assert_eq!(backend.case_fetches(), 1);

    assert!(dash.check_sync_status().await);
    assert!(!dash.sync().is_polling());
    assert_eq!(dash.sync().status, Some(idle()));
    let checked_at = Instant::now();

    assert_eq!(dash.next_event().await, DashboardUpdate::SyncFinished);
    assert_eq!(dash.next_event().await, DashboardUpdate::CasesRefetched);
    assert_eq!(checked_at.elapsed(), Duration::from_secs(1));
    assert_eq!(backend.case_fetches(), 2);

    assert!(timeout(Duration::from_secs(10), dash.next_event()).await.is_err());
    assert_eq!(backend.case_fetches(), 2);
    assert_eq!(backend.status_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn reload_during_sync_end_refetches_after_settling() {
    let (backend, mut dash) = dashboard();
    backend.push_status(Ok(running(9, 10)));
    backend.push_status(Ok(idle()));

    dash.mount().await;
    dash.reload().await;
    assert_eq!(backend.case_fetches(), 2);

    assert_eq!(dash.next_event().await, DashboardUpdate::SyncFinished);
    assert_eq!(dash.next_event().await, DashboardUpdate::CasesRefetched);
    assert_eq!(backend.case_fetches(), 3);
}

// =============================================================================
// filter changes
// =============================================================================

#[tokio::test(start_paused = true)]
async fn filter_change_notices_sync_started_elsewhere() {
    let (backend, mut dash) = dashboard();
    dash.mount().await;
    assert!(!dash.sync().is_polling());

    backend.push_status(Ok(running(1, 40)));
    assert!(dash.set_time_range(TimeRange::LastSixMonths).await);
    assert!(dash.sync().is_polling());
    assert_eq!(dash.sync().status, Some(running(1, 40)));
    assert_eq!(backend.status_calls(), 2);

    // Unchanged filter: no fetch, no status call.
    assert!(!dash.set_time_range(TimeRange::LastSixMonths).await);
    assert_eq!(backend.status_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn page_change_notices_sync_started_elsewhere() {
    let (backend, mut dash) = dashboard();
    backend.push_page(Ok(page(vec![], 120, 1, 50)));
    dash.mount().await;

    backend.push_page(Ok(page(vec![], 120, 2, 50)));
    backend.push_status(Ok(running(3, 40)));
    assert!(dash.go_to_page(2).await);
    assert!(dash.sync().is_polling());
}

#[tokio::test(start_paused = true)]
async fn debounced_search_notices_sync_started_elsewhere() {
    let (backend, mut dash) = dashboard();
    dash.mount().await;

    backend.push_status(Ok(running(7, 40)));
    dash.type_search("meier");
    assert_eq!(dash.next_event().await, DashboardUpdate::Search { reloaded: true });
    assert_eq!(backend.last_query().search.as_deref(), Some("meier"));
    assert!(dash.sync().is_polling());
    assert_eq!(backend.status_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn initial_query_keeps_page_and_search() {
    let backend = Arc::new(MockBackend::new());
    let query = QueryState { page: 3, search: "müller".into(), ..QueryState::default() };
    backend.push_page(Ok(page(vec![], 160, 3, 50)));
    let mut dash = Dashboard::with_query(backend.clone(), timings(), query);

    dash.mount().await;
    assert_eq!(backend.case_fetches(), 1);
    let sent = backend.last_query();
    assert_eq!(sent.page, 3);
    assert_eq!(sent.search.as_deref(), Some("müller"));

    assert!(timeout(Duration::from_secs(5), dash.next_event()).await.is_err());
    assert_eq!(dash.cases().query().page, 3);
    assert_eq!(backend.case_fetches(), 1);
}

// =============================================================================
// search
// =============================================================================

#[tokio::test(start_paused = true)]
async fn search_reaches_query_after_quiet_period() {
    let (backend, mut dash) = dashboard();
    backend.push_page(Ok(page(vec![], 120, 1, 50)));
    dash.mount().await;
    backend.push_page(Ok(page(vec![], 120, 2, 50)));
    dash.go_to_page(2).await;

    dash.type_search("mül");
    sleep(Duration::from_millis(100)).await;
    dash.type_search("müller");
    let typed_at = Instant::now();

    assert_eq!(dash.next_event().await, DashboardUpdate::Search { reloaded: true });
    assert!(typed_at.elapsed() >= Duration::from_millis(300));
    let query = backend.last_query();
    assert_eq!(query.search.as_deref(), Some("müller"));
    assert_eq!(query.page, 1);
    assert_eq!(backend.case_fetches(), 3);
    assert!(dash.cases().status_message().ends_with("(gefiltert)"));

    dash.type_search("müller ");
    assert_eq!(dash.next_event().await, DashboardUpdate::Search { reloaded: false });
    assert_eq!(backend.case_fetches(), 3);

    dash.clear_search();
    assert_eq!(dash.next_event().await, DashboardUpdate::Search { reloaded: true });
    assert_eq!(backend.last_query().search, None);
}

// =============================================================================
// start_sync
// =============================================================================

#[tokio::test(start_paused = true)]
async fn start_sync_triggers_and_polls() {
    let (backend, mut dash) = dashboard();
    backend.push_status(Ok(idle()));
    backend.push_status(Ok(running(0, 0)));
    backend.push_status(Ok(running(4, 10)));
    backend.push_status(Ok(idle()));

    dash.start_sync(SyncKind::All).await.unwrap();
    assert_eq!(*backend.triggers.lock().unwrap(), vec![SyncKind::All]);
    assert!(dash.sync().is_polling());
    assert_eq!(dash.sync().status, Some(running(0, 0)));
    assert_eq!(backend.status_calls(), 2);

    assert_eq!(dash.start_sync(SyncKind::Changed).await, Err(SyncStartError::AlreadyRunning));
    assert_eq!(backend.triggers.lock().unwrap().len(), 1);

    assert_eq!(dash.next_event().await, DashboardUpdate::SyncProgress);
    assert_eq!(dash.next_event().await, DashboardUpdate::SyncFinished);
    assert_eq!(dash.next_event().await, DashboardUpdate::CasesRefetched);
}

#[tokio::test(start_paused = true)]
async fn idle_answer_right_after_trigger_keeps_polling() {
    let (backend, mut dash) = dashboard();
    backend.push_status(Ok(idle()));
    backend.push_status(Ok(idle()));
    backend.push_status(Ok(running(2, 10)));

    dash.start_sync(SyncKind::Changed).await.unwrap();
    assert!(dash.sync().is_polling());
    assert!(dash.sync().is_running());

    assert_eq!(dash.next_event().await, DashboardUpdate::SyncProgress);
    assert_eq!(dash.sync().status, Some(running(2, 10)));
}

#[tokio::test(start_paused = true)]
async fn start_sync_refused_when_backend_running() {
    let (backend, mut dash) = dashboard();
    backend.push_status(Ok(running(3, 9)));

    assert_eq!(dash.start_sync(SyncKind::Changed).await, Err(SyncStartError::AlreadyRunning));
    assert!(backend.triggers.lock().unwrap().is_empty());
    assert!(dash.sync().is_polling());
    assert_eq!(dash.sync().status, Some(running(3, 9)));
}

#[tokio::test(start_paused = true)]
async fn start_sync_proceeds_when_status_unknown() {
    let (backend, mut dash) = dashboard();
    backend.push_status(Err(ApiError::Network("dns".into())));

    dash.start_sync(SyncKind::Changed).await.unwrap();
    assert_eq!(*backend.triggers.lock().unwrap(), vec![SyncKind::Changed]);
}

#[tokio::test(start_paused = true)]
async fn failed_trigger_returns_to_idle() {
    let (backend, mut dash) = dashboard();
    let err = ApiError::Status { status: 500, message: "boom".into() };
    backend.fail_trigger(err.clone());

    assert_eq!(dash.start_sync(SyncKind::Changed).await, Err(SyncStartError::Trigger(err)));
    assert!(!dash.sync().is_polling());

    sleep(Duration::from_secs(10)).await;
    assert_eq!(backend.status_calls(), 1);
}

// =============================================================================
// teardown
// =============================================================================

#[tokio::test(start_paused = true)]
async fn shutdown_stops_polling_and_search() {
    let (backend, mut dash) = dashboard();
    for _ in 0..20 {
        backend.push_status(Ok(running(1, 10)));
    }

    dash.mount().await;
    dash.type_search("pending");
    dash.shutdown();

    sleep(Duration::from_secs(30)).await;
    assert_eq!(backend.status_calls(), 1);
    assert_eq!(backend.case_fetches(), 1);
    assert_eq!(dash.next_event().await, DashboardUpdate::Closed);
}

#[tokio::test(start_paused = true)]
async fn dropping_dashboard_stops_polling() {
    let (backend, mut dash) = dashboard();
    for _ in 0..20 {
        backend.push_status(Ok(running(1, 10)));
    }

    dash.mount().await;
    drop(dash);

    sleep(Duration::from_secs(30)).await;
    assert_eq!(backend.status_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn sync_progress_is_presentable() {
    let (backend, mut dash) = dashboard();
    let mut status: SyncStatus = running(120, 480);
    status.elapsed_seconds = Some(125.0);
    status.stats.skipped_no_change = 2;
    status.stats.skipped_not_insurance = 1;
    backend.push_status(Ok(status));

    dash.check_sync_status().await;
    let progress = dash.sync().progress().unwrap();
    assert_eq!(progress.summary(), "120 / 480 (25%) | 2:05 | 3 übersprungen | 0 Fehler");
}
