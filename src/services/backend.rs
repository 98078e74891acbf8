//! The slice of the backend the dashboard depends on.
//!
//! The controller and the poller talk to this trait instead of
//! [`ApiClient`] directly so both can run against an in-memory backend.

use crate::net::api::{ApiClient, CaseQuery};
use crate::net::types::{ApiError, CasePage, SyncKind, SyncStatus};

#[async_trait::async_trait]
pub trait DashboardBackend: Send + Sync {
    /// Fetch one page of cases.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for transport failures, non-2xx responses and
    /// malformed bodies.
    async fn get_cases(&self, query: &CaseQuery) -> Result<CasePage, ApiError>;

    /// Read the backend sync job state.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the status cannot be read.
    async fn get_sync_status(&self) -> Result<SyncStatus, ApiError>;

    /// Start a sync job.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the backend refuses or cannot be reached.
    async fn trigger_sync(&self, kind: SyncKind) -> Result<(), ApiError>;
}

#[async_trait::async_trait]
impl DashboardBackend for ApiClient {
    async fn get_cases(&self, query: &CaseQuery) -> Result<CasePage, ApiError> {
        ApiClient::get_cases(self, query).await?.into_result()
    }

    async fn get_sync_status(&self) -> Result<SyncStatus, ApiError> {
        ApiClient::get_sync_status(self).await?.into_result()
    }

    async fn trigger_sync(&self, kind: SyncKind) -> Result<(), ApiError> {
        ApiClient::trigger_sync(self, kind).await?.into_result().map(drop)
    }
}
