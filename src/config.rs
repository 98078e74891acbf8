//! Client configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Every knob has a compiled-in default so the CLI works against a local
//! backend with no environment at all. Firebase is optional: without an API
//! key the session provider reports "not configured" instead of failing
//! startup, mirroring how the dashboard degrades when auth is missing.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SYNC_POLL_MS: u64 = 2000;
pub const DEFAULT_REFETCH_DELAY_MS: u64 = 1000;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

const SESSION_FILE_NAME: &str = "session.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("no home directory for the session file; set CASEDESK_SESSION_FILE")]
    NoSessionDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

/// Timer settings for one dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardTimings {
    /// Period between sync-status checks while a sync is running.
    pub sync_poll: Duration,
    /// Wait after a sync finishes before the case list is refetched.
    pub refetch_delay: Duration,
    /// Quiet period before typed search text reaches the query.
    pub search_debounce: Duration,
}

impl Default for DashboardTimings {
    fn default() -> Self {
        Self {
            sync_poll: Duration::from_millis(DEFAULT_SYNC_POLL_MS),
            refetch_delay: Duration::from_millis(DEFAULT_REFETCH_DELAY_MS),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub identity_url: String,
    pub secure_token_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskConfig {
    pub api_url: String,
    pub firebase: Option<FirebaseConfig>,
    pub timeouts: HttpTimeouts,
    pub timings: DashboardTimings,
    pub admin_uids: Vec<String>,
    pub session_file: PathBuf,
}

impl DeskConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `CASEDESK_API_URL`: backend base URL (default `http://127.0.0.1:8000`)
    /// - `FIREBASE_API_KEY`: enables sign-in when set and non-empty
    /// - `CASEDESK_IDENTITY_URL`, `CASEDESK_SECURE_TOKEN_URL`: identity endpoints
    /// - `CASEDESK_REQUEST_TIMEOUT_SECS`: default 120
    /// - `CASEDESK_CONNECT_TIMEOUT_SECS`: default 10
    /// - `CASEDESK_SYNC_POLL_MS`: default 2000
    /// - `CASEDESK_REFETCH_DELAY_MS`: default 1000
    /// - `CASEDESK_SEARCH_DEBOUNCE_MS`: default 300
    /// - `CASEDESK_ADMIN_UIDS`: comma-separated uids allowed to manage users
    /// - `CASEDESK_SESSION_FILE`: where the signed-in session is stored
    ///
    /// # Errors
    ///
    /// Returns an error if the API URL is not http(s) or no session file
    /// location can be determined.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = parse_base_url(
            "CASEDESK_API_URL",
            &std::env::var("CASEDESK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned()),
        )?;

        let firebase = std::env::var("FIREBASE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| FirebaseConfig {
                api_key: api_key.trim().to_owned(),
                identity_url: env_url("CASEDESK_IDENTITY_URL", DEFAULT_IDENTITY_URL),
                secure_token_url: env_url("CASEDESK_SECURE_TOKEN_URL", DEFAULT_SECURE_TOKEN_URL),
            });

        let timeouts = HttpTimeouts {
            request_secs: env_parse("CASEDESK_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("CASEDESK_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        // Zero periods would make tokio intervals panic.
        let timings = DashboardTimings {
            sync_poll: Duration::from_millis(env_parse("CASEDESK_SYNC_POLL_MS", DEFAULT_SYNC_POLL_MS).max(1)),
            refetch_delay: Duration::from_millis(env_parse("CASEDESK_REFETCH_DELAY_MS", DEFAULT_REFETCH_DELAY_MS)),
            search_debounce: Duration::from_millis(
                env_parse("CASEDESK_SEARCH_DEBOUNCE_MS", DEFAULT_SEARCH_DEBOUNCE_MS).max(1),
            ),
        };

        let admin_uids = parse_uid_list(std::env::var("CASEDESK_ADMIN_UIDS").ok().as_deref());

        let session_file = match std::env::var("CASEDESK_SESSION_FILE") {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_session_file()?,
        };

        Ok(Self { api_url, firebase, timeouts, timings, admin_uids, session_file })
    }

    /// Whether `uid` is allowed into the user-management commands.
    #[must_use]
    pub fn is_admin(&self, uid: &str) -> bool {
        self.admin_uids.iter().any(|admin| admin == uid)
    }
}

pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_url(key: &str, default: &str) -> String {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_owned())
        .trim_end_matches('/')
        .to_owned()
}

/// Validate an http(s) base URL and strip trailing slashes.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the scheme is not http or https.
pub fn parse_base_url(var: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Ok(trimmed.to_owned());
    }
    Err(ConfigError::Invalid { var, reason: format!("expected an http(s) URL, got '{raw}'") })
}

fn parse_uid_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|uid| !uid.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn default_session_file() -> Result<PathBuf, ConfigError> {
    directories::ProjectDirs::from("", "", "casedesk")
        .map(|dirs| dirs.config_dir().join(SESSION_FILE_NAME))
        .ok_or(ConfigError::NoSessionDir)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
