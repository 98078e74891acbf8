//! Result side of the case list: rows, counts and derived labels.

use super::query::{ALL_INSURANCES_LABEL, ALL_INSURANCES_VALUE, InsuranceFilter, QueryState};
use crate::net::types::{ApiError, CasePage, RepairCase};

/// Insurer excluded from the insurance selector.
const HIDDEN_INSURANCE: &str = "wertgarantie";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsuranceOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub message: String,
    /// The backend answered 2xx but the body had the wrong shape.
    pub malformed: bool,
}

impl From<&ApiError> for FetchError {
    fn from(err: &ApiError) -> Self {
        Self { message: err.to_string(), malformed: err.is_malformed() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseListState {
    pub rows: Vec<RepairCase>,
    pub total_count: u64,
    pub total_pages: u32,
    pub loading: bool,
    pub error: Option<FetchError>,
    /// Empty until derived from the first unfiltered page.
    pub insurance_options: Vec<InsuranceOption>,
}

impl Default for CaseListState {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            total_count: 0,
            total_pages: 1,
            loading: false,
            error: None,
            insurance_options: Vec::new(),
        }
    }
}

impl CaseListState {
    /// Store a successful page. Returns the page number echoed by the backend.
    pub fn apply_page(&mut self, page: CasePage) -> u32 {
        self.rows = page.cases;
        self.total_count = page.total_count;
        self.total_pages = page.total_pages.max(1);
        self.error = None;
        page.page.max(1)
    }

    pub fn apply_error(&mut self, err: &ApiError) {
        self.rows.clear();
        self.total_count = 0;
        self.total_pages = 1;
        self.error = Some(FetchError::from(err));
    }

    /// Derive the insurance selector from the current rows once.
    ///
    /// Only a first-page, all-insurance result with rows qualifies.
    pub fn derive_insurance_options(&mut self, query: &QueryState) -> bool {
        if !self.insurance_options.is_empty()
            || query.page != 1
            || query.insurance != InsuranceFilter::All
            || self.rows.is_empty()
        {
            return false;
        }

        let mut names: Vec<&str> = self
            .rows
            .iter()
            .filter_map(|row| row.insurance_name.as_deref())
            .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case(HIDDEN_INSURANCE))
            .collect();
        names.sort_unstable();
        names.dedup();

        let mut options = Vec::with_capacity(names.len() + 1);
        options.push(InsuranceOption { value: ALL_INSURANCES_VALUE.to_owned(), label: ALL_INSURANCES_LABEL.to_owned() });
        options.extend(names.into_iter().map(|name| InsuranceOption { value: name.to_owned(), label: name.to_owned() }));
        self.insurance_options = options;
        true
    }

    fn insurance_label<'a>(&'a self, name: &'a str) -> &'a str {
        self.insurance_options
            .iter()
            .find(|option| option.value == name)
            .map_or(name, |option| option.label.as_str())
    }

    /// `"{n} [aktive ]{Fall|Fälle}[ für X][ (time range)][ (gefiltert)]"`.
    #[must_use]
    pub fn status_message(&self, query: &QueryState) -> String {
        let word = if self.total_count == 1 { "Fall" } else { "Fälle" };
        let active = if query.show_active_only { "aktive " } else { "" };
        let mut message = format!("{} {active}{word}", self.total_count);

        if let Some(name) = query.insurance.name() {
            message.push_str(" für ");
            message.push_str(self.insurance_label(name));
        }
        if query.time_range.months().is_some() {
            message.push_str(&format!(" ({})", query.time_range.label()));
        }
        if !query.search.is_empty() {
            message.push_str(" (gefiltert)");
        }
        message
    }

    /// Explanation shown in place of an empty table.
    #[must_use]
    pub fn empty_message(&self, query: &QueryState) -> String {
        if !query.search.is_empty() {
            format!("Keine Fälle für Ihre Suche \"{}\" gefunden.", query.search)
        } else if query.insurance != InsuranceFilter::All {
            "Keine Fälle für die ausgewählte Versicherung gefunden.".to_owned()
        } else {
            "Keine aktiven Reparaturfälle mit Versicherungsschutz gefunden.".to_owned()
        }
    }

    /// First and last row numbers of `page` (1-based), or `None` when empty.
    #[must_use]
    pub fn row_range(&self, page: u32, limit: u32) -> Option<(u64, u64)> {
        if self.total_count == 0 {
            return None;
        }
        let first = u64::from(page.max(1) - 1) * u64::from(limit) + 1;
        let last = (first + u64::from(limit) - 1).min(self.total_count);
        (first <= last).then_some((first, last))
    }

    /// `"101–120 von 120"`, or `"0 von 0"` for an empty result.
    #[must_use]
    pub fn range_label(&self, page: u32, limit: u32) -> String {
        match self.row_range(page, limit) {
            Some((first, last)) => format!("{first}–{last} von {}", self.total_count),
            None => format!("0 von {}", self.total_count),
        }
    }
}

#[cfg(test)]
#[path = "cases_test.rs"]
mod tests;
