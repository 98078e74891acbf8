//! Wire types shared with the dashboard backend.
//!
//! Field names follow the backend's JSON exactly: case records use
//! camelCase, everything else snake_case. Case records are read-only
//! snapshots; nothing here is mutated after deserialization.

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by backend API calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout, body read).
    #[error("network request failed: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status.
    #[error("API Error: {status} {message}")]
    Status { status: u16, message: String },

    /// A 2xx response body did not have the expected shape.
    #[error("Invalid data format received from API: {0}")]
    Malformed(String),

    /// No signed-in session is available to authorize the request.
    #[error("not signed in")]
    Unauthenticated,

    /// The request could not be built locally.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A downloaded export could not be written.
    #[error("could not write export: {0}")]
    Io(String),
}

impl ApiError {
    /// Whether the error came from an unexpected response shape.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// =============================================================================
// ERROR PAYLOADS
// =============================================================================

/// One entry of a FastAPI validation error list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub loc: Vec<serde_json::Value>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Body of a non-2xx response.
///
/// The backend sends `{"detail": "..."}` for handled errors and
/// `{"detail": [ValidationError, ...]}` for rejected parameters; anything else
/// is kept as raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPayload {
    pub detail: Option<serde_json::Value>,
    pub raw: String,
}

impl ErrorPayload {
    #[must_use]
    pub fn from_body(raw: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(raw)
            .ok()
            .and_then(|value| value.get("detail").cloned());
        Self { detail, raw: raw.to_owned() }
    }

    /// Human-readable message, preferring the backend's `detail`.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.detail {
            Some(serde_json::Value::String(text)) => text.clone(),
            Some(serde_json::Value::Array(items)) => {
                let messages: Vec<String> = items
                    .iter()
                    .filter_map(|item| serde_json::from_value::<ValidationError>(item.clone()).ok())
                    .map(|err| err.msg)
                    .collect();
                if messages.is_empty() { self.raw.trim().to_owned() } else { messages.join("; ") }
            }
            Some(other) => other.to_string(),
            None => self.raw.trim().to_owned(),
        }
    }
}

// =============================================================================
// CASES
// =============================================================================

/// A repair case as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairCase {
    pub case_id: String,
    #[serde(default)]
    pub case_number: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_city: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub symptoms: Option<String>,
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub warranty: Option<String>,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub fetched_at: Option<String>,
    #[serde(default)]
    pub last_api_update: Option<String>,
    /// Raw upstream record; the backend sends either a JSON string or an object.
    #[serde(default)]
    pub raw_api_detail: Option<serde_json::Value>,
    #[serde(default)]
    pub insurance_contract_number: Option<String>,
    #[serde(default)]
    pub insurance_is_active: Option<bool>,
    #[serde(default)]
    pub insurance_name: Option<String>,
    #[serde(default)]
    pub insurance_deductible: Option<f64>,
    #[serde(default)]
    pub insurance_settlement_amount: Option<f64>,
    #[serde(default)]
    pub customer_company_name: Option<String>,
    #[serde(default)]
    pub customer_number: Option<String>,
    #[serde(default)]
    pub customer_first_name: Option<String>,
    #[serde(default)]
    pub customer_last_name: Option<String>,
    #[serde(default)]
    pub customer_phone_main: Option<String>,
    #[serde(default)]
    pub customer_zip_code: Option<String>,
    #[serde(default)]
    pub product_serial_number: Option<String>,
    #[serde(default)]
    pub total_repair_cost: Option<f64>,
}

/// One page of `GET /routes/cases`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CasePage {
    pub cases: Vec<RepairCase>,
    pub total_count: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

// =============================================================================
// SYNC
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    #[serde(default)]
    pub total_cases: u64,
    #[serde(default)]
    pub processed: u64,
    #[serde(default)]
    pub upserted: u64,
    #[serde(default)]
    pub skipped_no_change: u64,
    #[serde(default)]
    pub skipped_not_insurance: u64,
    #[serde(default)]
    pub errors: u64,
}

/// Backend sync job state from `GET /routes/sync-status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub is_running: bool,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub elapsed_seconds: Option<f64>,
    #[serde(default)]
    pub stats: SyncStats,
}

/// Which sync job to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    /// Only cases that changed since the last run.
    Changed,
    /// Every insurance case; timestamps move only on real changes.
    All,
}

impl SyncKind {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Changed => "/routes/sync-insurance-cases",
            Self::All => "/routes/sync-all-insurance-cases",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Changed => "Sync",
            Self::All => "Sync All",
        }
    }
}

// =============================================================================
// USERS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
}

pub const MIN_PASSWORD_LEN: usize = 6;

impl CreateUserRequest {
    /// Check the form before sending it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] when a field is empty or the
    /// password is shorter than [`MIN_PASSWORD_LEN`].
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ApiError::InvalidRequest("Email and password are required.".to_owned()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::InvalidRequest(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long."
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub creation_timestamp_ms: Option<i64>,
    #[serde(default)]
    pub last_sign_in_timestamp_ms: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetails {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    pub email_verified: bool,
    pub disabled: bool,
    #[serde(default)]
    pub metadata: UserMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserDetails>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Response of `GET /routes/me-admin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminMe {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin_match: bool,
    #[serde(default)]
    pub configured_admin_uids: Vec<String>,
}

// =============================================================================
// MISC
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Body for the Repairline old-case export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOldCasesRequest {
    pub case_numbers: Vec<String>,
}

impl ExportOldCasesRequest {
    /// Split pasted case numbers on newlines, commas and semicolons.
    #[must_use]
    pub fn from_input(input: &str) -> Self {
        let case_numbers = input
            .split(['\n', ',', ';'])
            .map(str::trim)
            .filter(|num| !num.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        Self { case_numbers }
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
