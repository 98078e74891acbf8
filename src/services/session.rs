//! Auth session provider.
//!
//! ARCHITECTURE
//! ============
//! Wraps the identity client and a session file. The current session lives
//! behind a tokio `RwLock`; readers see the signed-in user, and the
//! `Authorization` header path takes the write lock only when the id token
//! is about to expire, so concurrent requests trigger at most one refresh.
//!
//! TRADE-OFFS
//! ==========
//! The session file holds a refresh token in plain JSON. On unix it is
//! written with mode 0600; elsewhere it inherits the directory defaults.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::DeskConfig;
use crate::net::api::TokenSource;
use crate::net::identity::{AuthError, IdentityClient, Session, now_unix};
use crate::net::types::ApiError;
use crate::state::auth::{AuthState, AuthUser};

pub struct SessionProvider {
    identity: Option<IdentityClient>,
    session_file: PathBuf,
    session: RwLock<Option<Session>>,
    restored: AtomicBool,
}

impl SessionProvider {
    /// Build from config. Without Firebase settings every sign-in attempt
    /// reports [`AuthError::NotConfigured`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Network`] if the identity HTTP client cannot be built.
    pub fn from_config(config: &DeskConfig) -> Result<Self, AuthError> {
        let identity = config
            .firebase
            .clone()
            .map(|firebase| IdentityClient::new(firebase, config.timeouts))
            .transpose()?;
        Ok(Self::new(identity, config.session_file.clone()))
    }

    #[must_use]
    pub fn new(identity: Option<IdentityClient>, session_file: PathBuf) -> Self {
        Self { identity, session_file, session: RwLock::new(None), restored: AtomicBool::new(false) }
    }

    fn identity(&self) -> Result<&IdentityClient, AuthError> {
        self.identity.as_ref().ok_or(AuthError::NotConfigured)
    }

    async fn forget_session_file(&self) {
        if let Err(e) = tokio::fs::remove_file(&self.session_file).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.session_file.display(), error = %e, "stale session file not removed");
            }
        }
    }

    /// Load the stored session, if any. A missing or unreadable file means
    /// signed out.
    pub async fn restore(&self) -> AuthState {
        let loaded = match read_session(&self.session_file).await {
            Ok(session) => session,
            Err(e) => {
                warn!(path = %self.session_file.display(), error = %e, "ignoring stored session");
                None
            }
        };
        if let Some(session) = &loaded {
            debug!(uid = %session.uid, "session restored");
        }
        *self.session.write().await = loaded;
        self.restored.store(true, Ordering::SeqCst);
        self.auth_state().await
    }

    pub async fn auth_state(&self) -> AuthState {
        AuthState { user: self.current_user().await, loading: !self.restored.load(Ordering::SeqCst) }
    }

    pub async fn current_user(&self) -> Option<AuthUser> {
        self.session.read().await.as_ref().map(AuthUser::from)
    }

    /// Whether the signed-in user is one of `admin_uids`.
    pub async fn is_admin(&self, admin_uids: &[String]) -> bool {
        self.current_user()
            .await
            .is_some_and(|user| admin_uids.iter().any(|uid| *uid == user.uid))
    }

    /// Sign in with email and password and persist the session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotConfigured`] without Firebase settings, the
    /// mapped identity error on rejection, or [`AuthError::Storage`] if the
    /// session cannot be saved.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let session = self.identity()?.sign_in(email, password).await?;
        write_session(&self.session_file, &session).await?;
        let user = AuthUser::from(&session);
        *self.session.write().await = Some(session);
        self.restored.store(true, Ordering::SeqCst);
        info!(uid = %user.uid, "signed in");
        Ok(user)
    }

    /// Forget the session and delete the session file.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the file exists but cannot be removed.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        *self.session.write().await = None;
        match tokio::fs::remove_file(&self.session_file).await {
            Ok(()) => info!("signed out"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(AuthError::Storage(format!("{}: {e}", self.session_file.display()))),
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`AuthError::NotConfigured`] without Firebase settings or the
    /// mapped reset error.
    pub async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.identity()?.send_password_reset(email).await?;
        info!("password reset mail requested");
        Ok(())
    }

    /// Current id token, refreshed first when it expires within a minute.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionExpired`] when signed out or when the
    /// refresh is rejected; a rejected refresh also signs the user out.
    pub async fn id_token(&self) -> Result<String, AuthError> {
        let now = now_unix();
        {
            let guard = self.session.read().await;
            match guard.as_ref() {
                None => return Err(AuthError::SessionExpired("signed out".to_owned())),
                Some(session) if !session.needs_refresh(now) => return Ok(session.id_token.clone()),
                Some(_) => {}
            }
        }

        let mut guard = self.session.write().await;
        let Some(session) = guard.as_mut() else {
            return Err(AuthError::SessionExpired("signed out".to_owned()));
        };
        // Another request may have refreshed while we waited for the lock.
        if !session.needs_refresh(now_unix()) {
            return Ok(session.id_token.clone());
        }

        match self.identity()?.refresh(&session.refresh_token).await {
            Ok(grant) => {
                session.apply(grant);
                debug!(uid = %session.uid, expires_at = session.expires_at, "id token refreshed");
                if let Err(e) = write_session(&self.session_file, session).await {
                    warn!(error = %e, "refreshed session not persisted");
                }
                Ok(session.id_token.clone())
            }
            Err(e @ AuthError::SessionExpired(_)) => {
                warn!(uid = %session.uid, error = ?e, "refresh rejected; signing out");
                *guard = None;
                drop(guard);
                self.forget_session_file().await;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait::async_trait]
impl TokenSource for SessionProvider {
    async fn authorization_header(&self) -> Result<String, ApiError> {
        match self.id_token().await {
            Ok(token) => Ok(format!("Bearer {token}")),
            Err(AuthError::Network(e)) => Err(ApiError::Network(e)),
            Err(e) => {
                debug!(error = %e, "no usable session for request");
                Err(ApiError::Unauthenticated)
            }
        }
    }
}

async fn read_session(path: &Path) -> Result<Option<Session>, AuthError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| AuthError::Storage(format!("{}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AuthError::Storage(format!("{}: {e}", path.display()))),
    }
}

async fn write_session(path: &Path, session: &Session) -> Result<(), AuthError> {
    let storage = |e: std::io::Error| AuthError::Storage(format!("{}: {e}", path.display()));

    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await.map_err(storage)?;
    }
    let json = serde_json::to_vec_pretty(session).map_err(|e| AuthError::Storage(e.to_string()))?;

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    // Created private; the refresh token is never world-readable.
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options.open(path).await.map_err(storage)?;

    // `mode` only applies to new files; tighten one left by an older run.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .await
            .map_err(storage)?;
    }

    file.write_all(&json).await.map_err(storage)?;
    file.flush().await.map_err(storage)?;
    Ok(())
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
