//! Signed-in user as seen by the rest of the client.

use crate::net::identity::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
}

impl From<&Session> for AuthUser {
    fn from(session: &Session) -> Self {
        Self { uid: session.uid.clone(), email: session.email.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<AuthUser>,
    /// True until the stored session has been read.
    pub loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self { user: None, loading: true }
    }
}

impl AuthState {
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
