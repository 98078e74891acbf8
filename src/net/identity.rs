//! Firebase Identity Toolkit REST client.
//!
//! Covers the three calls the dashboard needs: password sign-in, password
//! reset mail, and id-token refresh. Response parsing is kept in pure
//! functions so error-code mapping can be tested without a network.
//!
//! ERROR HANDLING
//! ==============
//! Identity errors arrive as `{"error": {"message": "CODE : detail"}}`. The
//! code is mapped to the German message shown to the user; unknown codes fall
//! back to a generic message and the raw code is logged.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{FirebaseConfig, HttpTimeouts};

/// Seconds before expiry at which an id token is refreshed.
pub const REFRESH_LEEWAY_SECS: i64 = 60;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Firebase ist nicht konfiguriert. Bitte kontaktieren Sie den Administrator.")]
    NotConfigured,

    #[error("Bitte E-Mail-Adresse und Passwort eingeben.")]
    MissingCredentials,

    #[error("Ungültige E-Mail-Adresse oder falsches Passwort.")]
    UserNotFound,

    #[error(
        "Ungültige E-Mail-Adresse oder falsches Passwort. Wenn Sie ein importiertes Konto verwenden, \
         müssen Sie möglicherweise Ihr Passwort zurücksetzen."
    )]
    InvalidCredentials,

    #[error("Ungültige E-Mail-Adresse.")]
    InvalidEmail,

    #[error("Dieses Benutzerkonto wurde deaktiviert.")]
    UserDisabled,

    /// Any other sign-in failure; the payload is the identity error code.
    #[error("Anmeldung fehlgeschlagen. Bitte versuchen Sie es später erneut.")]
    SignInFailed(String),

    #[error("Kein Benutzer mit dieser E-Mail-Adresse gefunden.")]
    ResetUserNotFound,

    #[error("Ungültiges E-Mail-Format.")]
    ResetInvalidEmail,

    #[error("Fehler beim Senden der Passwort-Reset-E-Mail.")]
    ResetFailed(String),

    /// The refresh token was rejected; the user has to sign in again.
    #[error("Sitzung abgelaufen. Bitte melden Sie sich erneut an.")]
    SessionExpired(String),

    #[error("Keine Verbindung zum Anmeldedienst: {0}")]
    Network(String),

    #[error("Sitzung konnte nicht gespeichert werden: {0}")]
    Storage(String),
}

/// Map a sign-in error code to its user-facing error.
#[must_use]
pub fn sign_in_error(code: &str) -> AuthError {
    match code {
        "EMAIL_NOT_FOUND" => AuthError::UserNotFound,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => AuthError::InvalidCredentials,
        "INVALID_EMAIL" => AuthError::InvalidEmail,
        "USER_DISABLED" => AuthError::UserDisabled,
        other => AuthError::SignInFailed(other.to_owned()),
    }
}

/// Map a password-reset error code to its user-facing error.
#[must_use]
pub fn reset_error(code: &str) -> AuthError {
    match code {
        "EMAIL_NOT_FOUND" => AuthError::ResetUserNotFound,
        "INVALID_EMAIL" => AuthError::ResetInvalidEmail,
        other => AuthError::ResetFailed(other.to_owned()),
    }
}

#[derive(Debug, Deserialize)]
struct IdentityErrorBody {
    error: IdentityErrorDetail,
}

#[derive(Debug, Deserialize)]
struct IdentityErrorDetail {
    #[serde(default)]
    message: String,
}

/// Extract the bare error code from an identity error body.
///
/// `"TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled"` yields
/// `"TOO_MANY_ATTEMPTS_TRY_LATER"`; unparseable bodies yield `"UNKNOWN"`.
#[must_use]
pub fn error_code(body: &str) -> String {
    serde_json::from_str::<IdentityErrorBody>(body)
        .ok()
        .map(|parsed| parsed.error.message)
        .and_then(|message| message.split([' ', ':']).next().map(ToOwned::to_owned))
        .filter(|code| !code.is_empty())
        .unwrap_or_else(|| "UNKNOWN".to_owned())
}

// =============================================================================
// SESSION
// =============================================================================

/// Signed-in identity plus the tokens that keep it alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub uid: String,
    pub email: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    /// Unix seconds at which `id_token` expires.
    pub expires_at: i64,
}

impl Session {
    #[must_use]
    pub fn needs_refresh(&self, now: i64) -> bool {
        self.expires_at - now <= REFRESH_LEEWAY_SECS
    }

    /// Apply a refresh grant in place.
    pub fn apply(&mut self, grant: TokenGrant) {
        self.id_token = grant.id_token;
        self.refresh_token = grant.refresh_token;
        self.expires_at = grant.expires_at;
    }
}

/// New tokens from the secure-token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

fn expires_at(now: i64, expires_in: &str) -> i64 {
    now + expires_in.trim().parse::<i64>().unwrap_or(0)
}

pub(crate) fn parse_sign_in(status: u16, body: &str, now: i64) -> Result<Session, AuthError> {
    if !(200..300).contains(&status) {
        return Err(sign_in_error(&error_code(body)));
    }
    let parsed: SignInResponse =
        serde_json::from_str(body).map_err(|e| AuthError::SignInFailed(format!("invalid response: {e}")))?;
    Ok(Session {
        uid: parsed.local_id,
        email: parsed.email.filter(|email| !email.is_empty()),
        id_token: parsed.id_token,
        refresh_token: parsed.refresh_token,
        expires_at: expires_at(now, &parsed.expires_in),
    })
}

pub(crate) fn parse_refresh(status: u16, body: &str, now: i64) -> Result<TokenGrant, AuthError> {
    if !(200..300).contains(&status) {
        return Err(AuthError::SessionExpired(error_code(body)));
    }
    let parsed: RefreshResponse =
        serde_json::from_str(body).map_err(|e| AuthError::SessionExpired(format!("invalid response: {e}")))?;
    Ok(TokenGrant {
        id_token: parsed.id_token,
        refresh_token: parsed.refresh_token,
        expires_at: expires_at(now, &parsed.expires_in),
    })
}

pub(crate) fn parse_reset(status: u16, body: &str) -> Result<(), AuthError> {
    if (200..300).contains(&status) { Ok(()) } else { Err(reset_error(&error_code(body))) }
}

#[must_use]
pub fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    config: FirebaseConfig,
}

impl IdentityClient {
    /// # Errors
    ///
    /// Returns [`AuthError::Network`] if the HTTP client cannot be built.
    pub fn new(config: FirebaseConfig, timeouts: HttpTimeouts) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| AuthError::Network(e.to_string()))?;
        Ok(Self { http, config })
    }

    async fn post(&self, url: String, body: serde_json::Value) -> Result<(u16, String), AuthError> {
        let response = self
            .http
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| AuthError::Network(e.to_string()))?;
        Ok((status, text))
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`AuthError`] for rejected credentials.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let url = format!("{}/accounts:signInWithPassword", self.config.identity_url);
        let body = serde_json::json!({ "email": email, "password": password, "returnSecureToken": true });
        let (status, text) = self.post(url, body).await?;
        let result = parse_sign_in(status, &text, now_unix());
        match &result {
            Ok(session) => debug!(uid = %session.uid, "signed in"),
            Err(e) => warn!(status, code = %error_code(&text), error = %e, "sign-in rejected"),
        }
        result
    }

    /// Ask the identity service to mail a password-reset link.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`AuthError`] when the mail cannot be sent.
    pub async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let url = format!("{}/accounts:sendOobCode", self.config.identity_url);
        let body = serde_json::json!({ "requestType": "PASSWORD_RESET", "email": email.trim() });
        let (status, text) = self.post(url, body).await?;
        let result = parse_reset(status, &text);
        if let Err(e) = &result {
            warn!(status, code = %error_code(&text), error = %e, "password reset rejected");
        }
        result
    }

    /// Exchange a refresh token for a fresh id token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionExpired`] when the refresh token is rejected.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, AuthError> {
        let url = format!("{}/token", self.config.secure_token_url);
        let body = serde_json::json!({ "grant_type": "refresh_token", "refresh_token": refresh_token });
        let (status, text) = self.post(url, body).await?;
        parse_refresh(status, &text, now_unix())
    }
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
