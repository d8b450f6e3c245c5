use std::fmt;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::util::lock::{LockSite, RecoverRwLock};

const SOURCE: &str = "session::auth";

/// Route the view navigates to once the held token has expired.
pub const LOGIN_PATH: &str = "/login";

/// Toast raised once when the server rejects the held token.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Holds the token for the current session.
///
/// Presence of a token decides whether requests carry credentials and whether
/// guest-only tracking applies.
#[derive(Debug, Default)]
pub struct AuthSession {
    token: RwLock<Option<AuthToken>>,
    login_required: AtomicBool,
}

impl AuthSession {
    pub fn new(token: Option<AuthToken>) -> Self {
        Self {
            token: RwLock::new(token),
            login_required: AtomicBool::new(false),
        }
    }

    pub fn guest() -> Self {
        Self::new(None)
    }

    pub fn token(&self) -> Option<AuthToken> {
        self.token
            .read_recovered(LockSite::new(SOURCE, "token"))
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read_recovered(LockSite::new(SOURCE, "is_authenticated"))
            .is_some()
    }

    pub fn sign_in(&self, token: AuthToken) {
        *self.token.write_recovered(LockSite::new(SOURCE, "sign_in")) = Some(token);
        self.login_required.store(false, Ordering::SeqCst);
        info!("Session token installed");
    }

    /// Drop the token after an unauthorized response and request a redirect
    /// to the login page. Never retried.
    pub fn expire(&self) {
        let had_token = self
            .token
            .write_recovered(LockSite::new(SOURCE, "expire"))
            .take()
            .is_some();
        self.login_required.store(true, Ordering::SeqCst);
        warn!(had_token, "Session expired; login required");
    }

    /// Consume a pending login redirect, if any.
    pub fn take_login_redirect(&self) -> Option<&'static str> {
        self.login_required
            .swap(false, Ordering::SeqCst)
            .then_some(LOGIN_PATH)
    }
}
