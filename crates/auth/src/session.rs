//! Contract of the external session store (the hosted auth service).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AccessToken, AuthUser, OAuthProvider, Session};

/// Session store failure, as the caller observes it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid login credentials")]
    InvalidCredentials,

    /// The account exists but its email address was never confirmed.
    #[error("email not confirmed")]
    EmailNotConfirmed,

    #[error("user already registered")]
    AlreadyRegistered,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("no active session")]
    NoSession,

    /// The service answered with an error we do not classify further.
    #[error("session store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("session store unreachable: {0}")]
    Transport(String),
}

/// Outcome of a registration request.
///
/// `session` is `None` when the service defers the session until the email
/// address is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpResult {
    pub user: AuthUser,
    pub session: Option<Session>,
}

/// Where to send the browser to start a third-party sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthRedirect {
    pub provider: OAuthProvider,
    pub url: String,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, SessionError>;

    async fn sign_up(&self, email: &str, password: &str, redirect_to: &str) -> Result<SignUpResult, SessionError>;

    /// Build the authorize URL; the flow finishes out-of-process.
    async fn oauth_redirect(&self, provider: &OAuthProvider, redirect_to: &str) -> Result<OAuthRedirect, SessionError>;

    async fn resend_confirmation(&self, email: &str) -> Result<(), SessionError>;

    async fn sign_out(&self, token: &AccessToken) -> Result<(), SessionError>;

    /// Resolve a bearer token to its user. Fails with `InvalidToken` for anything
    /// the service does not accept.
    async fn get_user(&self, token: &AccessToken) -> Result<AuthUser, SessionError>;
}
