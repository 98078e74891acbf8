//! REST client for the dashboard backend.
//!
//! One method per backend route. Every method returns an [`ApiResponse`]
//! carrying the HTTP status and either the parsed body or the backend's
//! error payload; transport failures and malformed 2xx bodies surface as
//! [`ApiError`] directly. Nothing is retried.
//!
//! AUTH
//! ====
//! Each request asks the [`TokenSource`] for a fresh `Authorization` header
//! right before sending, so an id token refreshed mid-session is picked up
//! without rebuilding the client.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::types::{
    AdminMe, ApiError, CasePage, CreateUserRequest, CreateUserResponse, ErrorPayload, ExportOldCasesRequest,
    HealthResponse, ListUsersResponse, RepairCase, SyncKind, SyncStatus,
};
use crate::config::HttpTimeouts;

// =============================================================================
// TOKEN SOURCE
// =============================================================================

/// Produces the `Authorization` header value for backend requests.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync {
    /// Return a header value such as `Bearer <id token>`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthenticated`] when no session is available.
    async fn authorization_header(&self) -> Result<String, ApiError>;
}

/// A fixed token, e.g. passed on the command line.
#[derive(Debug, Clone)]
pub struct StaticToken {
    header: Option<String>,
}

impl StaticToken {
    #[must_use]
    pub fn bearer(token: &str) -> Self {
        Self { header: Some(format!("Bearer {}", token.trim())) }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self { header: None }
    }
}

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn authorization_header(&self) -> Result<String, ApiError> {
        self.header.clone().ok_or(ApiError::Unauthenticated)
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// Outcome of one backend call that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub body: Result<T, ErrorPayload>,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status) && self.body.is_ok()
    }

    /// Collapse into the parsed body or an [`ApiError::Status`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] for non-2xx responses.
    pub fn into_result(self) -> Result<T, ApiError> {
        let status = self.status;
        self.body.map_err(|payload| status_error(status, &payload))
    }
}

fn status_error(status: u16, payload: &ErrorPayload) -> ApiError {
    let mut message = payload.message();
    if message.is_empty() {
        message = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or_default()
            .to_owned();
    }
    ApiError::Status { status, message }
}

pub(crate) fn parse_response<T: DeserializeOwned>(status: u16, text: &str) -> Result<ApiResponse<T>, ApiError> {
    if !(200..300).contains(&status) {
        return Ok(ApiResponse { status, body: Err(ErrorPayload::from_body(text)) });
    }

    let parsed = if text.trim().is_empty() {
        serde_json::from_value(serde_json::Value::Null)
    } else {
        serde_json::from_str(text)
    };
    let data = parsed.map_err(|e| ApiError::Malformed(e.to_string()))?;
    Ok(ApiResponse { status, body: Ok(data) })
}

// =============================================================================
// CASE QUERY
// =============================================================================

/// Query parameters of `GET /routes/cases`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseQuery {
    pub insurance_name: Option<String>,
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub show_active_only: bool,
    pub time_range_months: Option<u32>,
    pub sort_by: String,
    pub sort_direction: &'static str,
}

impl CaseQuery {
    /// Encode as query pairs, omitting unset optional filters.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(8);
        if let Some(name) = &self.insurance_name {
            pairs.push(("insuranceName", name.clone()));
        }
        pairs.push(("page", self.page.to_string()));
        pairs.push(("limit", self.limit.to_string()));
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs.push(("showActiveOnly", self.show_active_only.to_string()));
        if let Some(months) = self.time_range_months {
            pairs.push(("timeRangeMonths", months.to_string()));
        }
        pairs.push(("sortBy", self.sort_by.clone()));
        pairs.push(("sortDirection", self.sort_direction.to_owned()));
        pairs
    }
}

// =============================================================================
// EXPORT DOWNLOAD
// =============================================================================

/// A successful binary export whose body has not been read yet.
pub struct ExportDownload {
    response: reqwest::Response,
    pub file_name: String,
    pub content_type: Option<String>,
}

impl ExportDownload {
    /// Stream the body into `path`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the body stream breaks and
    /// [`ApiError::Io`] if the file cannot be written.
    pub async fn save_to(self, path: &Path) -> Result<u64, ApiError> {
        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| ApiError::Io(format!("{}: {e}", path.display())))?;
        let mut stream = self.response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ApiError::Network(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| ApiError::Io(format!("{}: {e}", path.display())))?;
            written = written.saturating_add(u64::try_from(chunk.len()).unwrap_or(u64::MAX));
        }

        file.flush()
            .await
            .map_err(|e| ApiError::Io(format!("{}: {e}", path.display())))?;
        Ok(written)
    }
}

/// Extract a plain `filename=` from a `Content-Disposition` header.
///
/// Only the final path component is kept so a hostile header cannot point
/// outside the working directory.
pub(crate) fn content_disposition_filename(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim().trim_matches('"'))
        .and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(ToOwned::to_owned)
}

fn path_segment(id: &str) -> Result<&str, ApiError> {
    let id = id.trim();
    if id.is_empty() || id.contains(['/', '?', '#']) || id.chars().any(char::is_whitespace) {
        return Err(ApiError::InvalidRequest(format!("invalid case id '{id}'")));
    }
    Ok(id)
}

// =============================================================================
// CLIENT
// =============================================================================

/// Typed client for the dashboard backend.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth: Arc<dyn TokenSource>,
}

impl ApiClient {
    /// Build a client for `base_url` (no trailing slash).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeouts: HttpTimeouts, auth: Arc<dyn TokenSource>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned(), auth })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let header = self.auth.authorization_header().await?;
        Ok(self.http.request(method, self.url(path)).header(AUTHORIZATION, header))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<ApiResponse<T>, ApiError> {
        let response = request.send().await.map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let url = response.url().path().to_owned();
        let text = response.text().await.map_err(|e| ApiError::Network(e.to_string()))?;
        debug!(%url, status, bytes = text.len(), "api response");
        parse_response(status, &text)
    }

    async fn start_export(&self, request: RequestBuilder, default_name: &str) -> Result<ExportDownload, ApiError> {
        let response = request.send().await.map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &ErrorPayload::from_body(&text)));
        }

        let headers = response.headers();
        let file_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(content_disposition_filename)
            .unwrap_or_else(|| default_name.to_owned());
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);
        debug!(%file_name, ?content_type, "export stream opened");
        Ok(ExportDownload { response, file_name, content_type })
    }

    /// `GET /_healthz`. Sends the auth header only when a session exists.
    pub async fn check_health(&self) -> Result<ApiResponse<HealthResponse>, ApiError> {
        let mut request = self.http.get(self.url("/_healthz"));
        if let Ok(header) = self.auth.authorization_header().await {
            request = request.header(AUTHORIZATION, header);
        }
        self.send_json(request).await
    }

    /// `GET /routes/cases`.
    pub async fn get_cases(&self, query: &CaseQuery) -> Result<ApiResponse<CasePage>, ApiError> {
        let request = self.authorized(Method::GET, "/routes/cases").await?.query(&query.to_pairs());
        self.send_json(request).await
    }

    /// `GET /routes/repair-case/{case_id}`.
    pub async fn get_repair_case_details(&self, case_id: &str) -> Result<ApiResponse<RepairCase>, ApiError> {
        let path = format!("/routes/repair-case/{}", path_segment(case_id)?);
        let request = self.authorized(Method::GET, &path).await?;
        self.send_json(request).await
    }

    /// `GET /routes/sync-status`.
    pub async fn get_sync_status(&self) -> Result<ApiResponse<SyncStatus>, ApiError> {
        let request = self.authorized(Method::GET, "/routes/sync-status").await?;
        self.send_json(request).await
    }

    /// `POST /routes/sync-insurance-cases` or `/routes/sync-all-insurance-cases`.
    pub async fn trigger_sync(&self, kind: SyncKind) -> Result<ApiResponse<serde_json::Value>, ApiError> {
        let request = self.authorized(Method::POST, kind.path()).await?;
        self.send_json(request).await
    }

    /// `POST /routes/test-single-sync/{case_id}`.
    pub async fn test_single_sync(&self, case_id: u64) -> Result<ApiResponse<serde_json::Value>, ApiError> {
        let request = self
            .authorized(Method::POST, &format!("/routes/test-single-sync/{case_id}"))
            .await?;
        self.send_json(request).await
    }

    /// `GET /routes/export-repair-cases-csv`.
    pub async fn export_repair_cases_csv(&self, insurance_name: Option<&str>) -> Result<ExportDownload, ApiError> {
        let mut request = self.authorized(Method::GET, "/routes/export-repair-cases-csv").await?;
        if let Some(name) = insurance_name {
            request = request.query(&[("insuranceName", name)]);
        }
        self.start_export(request, "repair_cases.csv").await
    }

    /// `GET /routes/export-old-repair-cases-excel`.
    pub async fn export_old_repair_cases_excel(&self) -> Result<ExportDownload, ApiError> {
        let request = self
            .authorized(Method::GET, "/routes/export-old-repair-cases-excel")
            .await?;
        self.start_export(request, "old_repair_cases.xlsx").await
    }

    /// `POST /routes/export-specific-old-cases-from-reparline-excel`.
    pub async fn export_specific_old_cases(&self, body: &ExportOldCasesRequest) -> Result<ExportDownload, ApiError> {
        if body.case_numbers.is_empty() {
            return Err(ApiError::InvalidRequest("no case numbers given".to_owned()));
        }
        let request = self
            .authorized(Method::POST, "/routes/export-specific-old-cases-from-reparline-excel")
            .await?
            .json(body);
        self.start_export(request, "old_cases_export.xlsx").await
    }

    /// `POST /routes/create-firebase-user`. The request is validated first.
    pub async fn create_firebase_user(
        &self,
        body: &CreateUserRequest,
    ) -> Result<ApiResponse<CreateUserResponse>, ApiError> {
        body.validate()?;
        let request = self
            .authorized(Method::POST, "/routes/create-firebase-user")
            .await?
            .json(body);
        self.send_json(request).await
    }

    /// `GET /routes/list-firebase-users`.
    pub async fn list_firebase_users(&self, page_token: Option<&str>) -> Result<ApiResponse<ListUsersResponse>, ApiError> {
        let mut request = self.authorized(Method::GET, "/routes/list-firebase-users").await?;
        if let Some(token) = page_token {
            request = request.query(&[("page_token", token)]);
        }
        self.send_json(request).await
    }

    /// `GET /routes/me-admin`.
    pub async fn read_admin_me(&self) -> Result<ApiResponse<AdminMe>, ApiError> {
        let request = self.authorized(Method::GET, "/routes/me-admin").await?;
        self.send_json(request).await
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
