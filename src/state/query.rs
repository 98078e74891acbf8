//! Filter, sort and pagination state of the case list.
//!
//! Every setter reports whether it changed anything. A change to any field
//! other than the page resets the page to 1, so callers only need to refetch
//! when a setter returns `true`.

use crate::net::api::CaseQuery;

/// Sentinel used by the dashboard for the unfiltered insurance option.
pub const ALL_INSURANCES_VALUE: &str = "_ALL_INSURANCES_";
pub const ALL_INSURANCES_LABEL: &str = "Alle Versicherungen";

/// Sort column used when the user has not picked one.
pub const DEFAULT_SORT_COLUMN: &str = "lastApiUpdate";

// =============================================================================
// FILTER VALUES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InsuranceFilter {
    #[default]
    All,
    Named(String),
}

impl InsuranceFilter {
    /// Parse a selector value; the sentinel and blanks mean "all".
    #[must_use]
    pub fn from_value(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL_INSURANCES_VALUE {
            Self::All
        } else {
            Self::Named(value.to_owned())
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Named(name) => Some(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    Small,
    #[default]
    Medium,
    Large,
    Max,
}

impl PageSize {
    pub const ALL: [Self; 4] = [Self::Small, Self::Medium, Self::Large, Self::Max];

    #[must_use]
    pub fn limit(self) -> u32 {
        match self {
            Self::Small => 25,
            Self::Medium => 50,
            Self::Large => 100,
            Self::Max => 200,
        }
    }

    /// Only the four offered sizes are accepted.
    #[must_use]
    pub fn from_limit(limit: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|size| size.limit() == limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CaseId,
    CaseNumber,
    CustomerName,
    ProductName,
    Status,
    InsuranceName,
    LastApiUpdate,
    InsuranceContractNumber,
}

impl SortKey {
    pub const ALL: [Self; 8] = [
        Self::CaseId,
        Self::CaseNumber,
        Self::CustomerName,
        Self::ProductName,
        Self::Status,
        Self::InsuranceName,
        Self::LastApiUpdate,
        Self::InsuranceContractNumber,
    ];

    /// Backend column name.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::CaseId => "caseId",
            Self::CaseNumber => "caseNumber",
            Self::CustomerName => "customerName",
            Self::ProductName => "productName",
            Self::Status => "status",
            Self::InsuranceName => "insuranceName",
            Self::LastApiUpdate => "lastApiUpdate",
            Self::InsuranceContractNumber => "insuranceContractNumber",
        }
    }

    #[must_use]
    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.column() == column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }

    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    #[default]
    AllTime,
    LastMonth,
    LastThreeMonths,
    LastSixMonths,
    LastYear,
}

impl TimeRange {
    pub const ALL: [Self; 5] =
        [Self::AllTime, Self::LastMonth, Self::LastThreeMonths, Self::LastSixMonths, Self::LastYear];

    /// Months sent as `timeRangeMonths`; `None` disables the filter.
    #[must_use]
    pub fn months(self) -> Option<u32> {
        match self {
            Self::AllTime => None,
            Self::LastMonth => Some(1),
            Self::LastThreeMonths => Some(3),
            Self::LastSixMonths => Some(6),
            Self::LastYear => Some(12),
        }
    }

    #[must_use]
    pub fn from_months(months: u32) -> Option<Self> {
        if months == 0 {
            return Some(Self::AllTime);
        }
        Self::ALL.into_iter().find(|range| range.months() == Some(months))
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::AllTime => "Alle Zeiträume",
            Self::LastMonth => "Letzter Monat",
            Self::LastThreeMonths => "Letzte 3 Monate",
            Self::LastSixMonths => "Letzte 6 Monate",
            Self::LastYear => "Letztes Jahr",
        }
    }
}

// =============================================================================
// QUERY STATE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    pub insurance: InsuranceFilter,
    pub page: u32,
    pub page_size: PageSize,
    /// Debounced search text, already trimmed.
    pub search: String,
    pub show_active_only: bool,
    pub time_range: TimeRange,
    pub sort_key: Option<SortKey>,
    pub sort_direction: SortDirection,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            insurance: InsuranceFilter::All,
            page: 1,
            page_size: PageSize::default(),
            search: String::new(),
            show_active_only: true,
            time_range: TimeRange::AllTime,
            sort_key: None,
            sort_direction: SortDirection::Ascending,
        }
    }
}

impl QueryState {
    fn reset_page_if(&mut self, changed: bool) -> bool {
        if changed {
            self.page = 1;
        }
        changed
    }

    pub fn set_insurance(&mut self, filter: InsuranceFilter) -> bool {
        let changed = self.insurance != filter;
        self.insurance = filter;
        self.reset_page_if(changed)
    }

    pub fn set_page_size(&mut self, size: PageSize) -> bool {
        let changed = self.page_size != size;
        self.page_size = size;
        self.reset_page_if(changed)
    }

    /// Same key flips direction; a new key starts ascending.
    pub fn toggle_sort(&mut self, key: SortKey) -> bool {
        if self.sort_key == Some(key) {
            self.sort_direction = self.sort_direction.flipped();
        } else {
            self.sort_key = Some(key);
            self.sort_direction = SortDirection::Ascending;
        }
        self.reset_page_if(true)
    }

    pub fn set_show_active_only(&mut self, active_only: bool) -> bool {
        let changed = self.show_active_only != active_only;
        self.show_active_only = active_only;
        self.reset_page_if(changed)
    }

    pub fn set_time_range(&mut self, range: TimeRange) -> bool {
        let changed = self.time_range != range;
        self.time_range = range;
        self.reset_page_if(changed)
    }

    pub fn set_search(&mut self, term: &str) -> bool {
        let term = term.trim();
        let changed = self.search != term;
        if changed {
            term.clone_into(&mut self.search);
        }
        self.reset_page_if(changed)
    }

    /// Move to `page` if it lies in `1..=total_pages`.
    pub fn set_page(&mut self, page: u32, total_pages: u32) -> bool {
        if page < 1 || page > total_pages.max(1) || page == self.page {
            return false;
        }
        self.page = page;
        true
    }

    #[must_use]
    pub fn to_request(&self) -> CaseQuery {
        CaseQuery {
            insurance_name: self.insurance.name().map(ToOwned::to_owned),
            page: self.page,
            limit: self.page_size.limit(),
            search: (!self.search.is_empty()).then(|| self.search.clone()),
            show_active_only: self.show_active_only,
            time_range_months: self.time_range.months(),
            sort_by: self
                .sort_key
                .map_or(DEFAULT_SORT_COLUMN, SortKey::column)
                .to_owned(),
            sort_direction: self.sort_direction.as_param(),
        }
    }
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
