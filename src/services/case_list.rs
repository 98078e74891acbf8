//! Case list controller: query state in, one page of cases out.
//!
//! DESIGN
//! ======
//! The controller owns its [`QueryState`] and [`CaseListState`]. Every
//! mutating operation takes `&mut self`, so two fetches of the same
//! controller can never be in flight at once and the stored rows always
//! belong to the most recent query.
//!
//! ERROR HANDLING
//! ==============
//! A failed fetch never propagates. The error is stored on the state, rows
//! are cleared, the count drops to zero and the page returns to 1, matching
//! what the dashboard shows.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::backend::DashboardBackend;
use crate::state::cases::{CaseListState, InsuranceOption};
use crate::state::query::{InsuranceFilter, PageSize, QueryState, SortKey, TimeRange};

pub struct CaseListController {
    backend: Arc<dyn DashboardBackend>,
    query: QueryState,
    state: CaseListState,
}

impl CaseListController {
    #[must_use]
    pub fn new(backend: Arc<dyn DashboardBackend>) -> Self {
        Self::with_query(backend, QueryState::default())
    }

    #[must_use]
    pub fn with_query(backend: Arc<dyn DashboardBackend>, query: QueryState) -> Self {
        Self { backend, query, state: CaseListState::default() }
    }

    #[must_use]
    pub fn query(&self) -> &QueryState {
        &self.query
    }

    #[must_use]
    pub fn state(&self) -> &CaseListState {
        &self.state
    }

    #[must_use]
    pub fn insurance_options(&self) -> &[InsuranceOption] {
        &self.state.insurance_options
    }

    /// Issue `GET /routes/cases` for the current query and store the result.
    ///
    /// Returns `true` when the page loaded.
    pub async fn fetch(&mut self) -> bool {
        let request = self.query.to_request();
        debug!(
            insurance = request.insurance_name.as_deref().unwrap_or("(all)"),
            page = request.page,
            limit = request.limit,
            "fetching cases"
        );

        self.state.loading = true;
        let result = self.backend.get_cases(&request).await;
        self.state.loading = false;

        match result {
            Ok(page) => {
                let rows = page.cases.len();
                self.query.page = self.state.apply_page(page);
                if self.state.derive_insurance_options(&self.query) {
                    debug!(options = self.state.insurance_options.len() - 1, "insurance options derived");
                }
                info!(
                    page = self.query.page,
                    rows,
                    total = self.state.total_count,
                    pages = self.state.total_pages,
                    "cases loaded"
                );
                true
            }
            Err(e) => {
                warn!(error = %e, malformed = e.is_malformed(), "case fetch failed");
                self.state.apply_error(&e);
                // Error state reports a single page.
                self.query.page = self.query.page.min(self.state.total_pages);
                false
            }
        }
    }

    async fn fetch_if(&mut self, changed: bool) -> bool {
        if changed {
            self.fetch().await;
        }
        changed
    }

    /// Each setter below fetches page 1 when the value changed and returns
    /// whether it did.
    pub async fn set_insurance(&mut self, filter: InsuranceFilter) -> bool {
        let changed = self.query.set_insurance(filter);
        self.fetch_if(changed).await
    }

    pub async fn set_page_size(&mut self, size: PageSize) -> bool {
        let changed = self.query.set_page_size(size);
        self.fetch_if(changed).await
    }

    pub async fn toggle_sort(&mut self, key: SortKey) -> bool {
        let changed = self.query.toggle_sort(key);
        self.fetch_if(changed).await
    }

    pub async fn set_show_active_only(&mut self, active_only: bool) -> bool {
        let changed = self.query.set_show_active_only(active_only);
        self.fetch_if(changed).await
    }

    pub async fn set_time_range(&mut self, range: TimeRange) -> bool {
        let changed = self.query.set_time_range(range);
        self.fetch_if(changed).await
    }

    /// Apply already-debounced search text.
    pub async fn apply_search(&mut self, term: &str) -> bool {
        let changed = self.query.set_search(term);
        self.fetch_if(changed).await
    }

    /// Jump to page `n`; ignored unless `1 <= n <= total_pages`.
    pub async fn go_to_page(&mut self, n: u32) -> bool {
        let changed = self.query.set_page(n, self.state.total_pages);
        if !changed {
            debug!(requested = n, pages = self.state.total_pages, "page change ignored");
        }
        self.fetch_if(changed).await
    }

    #[must_use]
    pub fn status_message(&self) -> String {
        self.state.status_message(&self.query)
    }

    #[must_use]
    pub fn range_label(&self) -> String {
        self.state.range_label(self.query.page, self.query.page_size.limit())
    }
}

#[cfg(test)]
#[path = "case_list_test.rs"]
mod tests;
