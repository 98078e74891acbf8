//! In-memory backend shared by service and dashboard tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::backend::DashboardBackend;
use crate::net::api::CaseQuery;
use crate::net::types::{ApiError, CasePage, RepairCase, SyncKind, SyncStats, SyncStatus};

#[derive(Default)]
pub struct MockBackend {
    pages: Mutex<VecDeque<Result<CasePage, ApiError>>>,
    statuses: Mutex<VecDeque<Result<SyncStatus, ApiError>>>,
    trigger_error: Mutex<Option<ApiError>>,
    pub queries: Mutex<Vec<CaseQuery>>,
    pub triggers: Mutex<Vec<SyncKind>>,
    status_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, page: Result<CasePage, ApiError>) {
        self.pages.lock().unwrap().push_back(page);
    }

    pub fn push_status(&self, status: Result<SyncStatus, ApiError>) {
        self.statuses.lock().unwrap().push_back(status);
    }

    pub fn fail_trigger(&self, err: ApiError) {
        *self.trigger_error.lock().unwrap() = Some(err);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn case_fetches(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn last_query(&self) -> CaseQuery {
        self.queries.lock().unwrap().last().cloned().expect("no case fetch recorded")
    }
}

#[async_trait::async_trait]
impl DashboardBackend for MockBackend {
    async fn get_cases(&self, query: &CaseQuery) -> Result<CasePage, ApiError> {
        self.queries.lock().unwrap().push(query.clone());
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(empty_page(query.page, query.limit)))
    }

    /// Scripted statuses are served in order; once exhausted the backend is idle.
    async fn get_sync_status(&self) -> Result<SyncStatus, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SyncStatus::default()))
    }

    async fn trigger_sync(&self, kind: SyncKind) -> Result<(), ApiError> {
        self.triggers.lock().unwrap().push(kind);
        match self.trigger_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub fn case(id: &str, insurance: Option<&str>) -> RepairCase {
    serde_json::from_value(serde_json::json!({ "caseId": id, "insuranceName": insurance })).unwrap()
}

pub fn empty_page(page: u32, limit: u32) -> CasePage {
    CasePage { cases: Vec::new(), total_count: 0, page, limit, total_pages: 0 }
}

pub fn page(cases: Vec<RepairCase>, total_count: u64, page: u32, limit: u32) -> CasePage {
    let total_pages = u32::try_from(total_count.div_ceil(u64::from(limit))).unwrap();
    CasePage { cases, total_count, page, limit, total_pages }
}

pub fn running(processed: u64, total: u64) -> SyncStatus {
    SyncStatus {
        is_running: true,
        start_time: Some("2024-03-01T10:00:00".into()),
        elapsed_seconds: Some(4.0),
        stats: SyncStats { total_cases: total, processed, ..SyncStats::default() },
    }
}

pub fn idle() -> SyncStatus {
    SyncStatus::default()
}
