//! Completing a user's setup from the client side.
//!
//! [`HttpSetup`] calls the server's `POST /setup-user`. [`LocalSetup`] does the
//! same work in-process, for single-binary runs and tests.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use gradeportal_auth::{AccessToken, SessionStore};

use crate::services::{AccountError, AccountService, SetupUserRequest};
use crate::store::PolicyStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("invalid token")]
    Unauthenticated,

    #[error("setup rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error(transparent)]
    Account(AccountError),

    #[error("setup endpoint unreachable: {0}")]
    Transport(String),
}

#[async_trait]
pub trait ProfileSetup: Send + Sync {
    async fn setup(&self, token: &AccessToken, request: &SetupUserRequest) -> Result<(), SetupError>;
}

pub struct LocalSetup<S> {
    sessions: Arc<dyn SessionStore>,
    accounts: AccountService<S>,
}

impl<S: PolicyStore + Clone> LocalSetup<S> {
    pub fn new(sessions: Arc<dyn SessionStore>, store: S) -> Self {
        Self {
            sessions,
            accounts: AccountService::new(store),
        }
    }
}

#[async_trait]
impl<S: PolicyStore + Clone> ProfileSetup for LocalSetup<S> {
    async fn setup(&self, token: &AccessToken, request: &SetupUserRequest) -> Result<(), SetupError> {
        let user = self
            .sessions
            .get_user(token)
            .await
            .map_err(|_| SetupError::Unauthenticated)?;
        self.accounts
            .setup_user(&user, request)
            .await
            .map(|_| ())
            .map_err(SetupError::Account)
    }
}

pub struct HttpSetup {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Default, Deserialize)]
struct MessageBody {
    message: Option<String>,
}

impl HttpSetup {
    /// `server_url` is the portal server's base URL.
    pub fn new(server_url: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/setup-user", server_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ProfileSetup for HttpSetup {
    async fn setup(&self, token: &AccessToken, request: &SetupUserRequest) -> Result<(), SetupError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token.as_str())
            .json(request)
            .send()
            .await
            .map_err(|e| SetupError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status.as_u16() == 401 {
            return Err(SetupError::Unauthenticated);
        }
        let body = response.text().await.unwrap_or_default();
        let parsed: MessageBody = serde_json::from_str(&body).unwrap_or_default();
        Err(SetupError::Rejected {
            status: status.as_u16(),
            message: parsed
                .message
                .unwrap_or_else(|| "Failed to setup user profile".to_string()),
        })
    }
}
