//! In-memory session store (dev/tests).
//!
//! Accounts live in a map keyed by lowercased email. Tokens are real HS256 JWTs
//! so the in-memory data store can recover the caller from them.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Url;

use gradeportal_auth::{
    AccessToken, AuthUser, Hs256TokenCodec, OAuthProvider, OAuthRedirect, Session, SessionError, SessionStore,
    SignUpResult,
};
use gradeportal_core::UserId;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug)]
struct Account {
    user: AuthUser,
    /// `None` for accounts created through a third-party provider.
    password: Option<String>,
    confirmed: bool,
}

#[derive(Debug, Default)]
struct Accounts {
    by_email: HashMap<String, Account>,
    revoked: HashSet<String>,
    confirmations_sent: HashMap<String, usize>,
}

pub struct InMemorySessionStore {
    codec: Hs256TokenCodec,
    ttl: Duration,
    require_confirmation: bool,
    accounts: Mutex<Accounts>,
}

impl InMemorySessionStore {
    /// Sign-ups are confirmed immediately and get a session right away.
    pub fn new(codec: Hs256TokenCodec) -> Self {
        Self {
            codec,
            ttl: Duration::hours(1),
            require_confirmation: false,
            accounts: Mutex::new(Accounts::default()),
        }
    }

    /// Sign-ups stay unconfirmed (and session-less) until [`Self::confirm_email`].
    pub fn with_email_confirmation(mut self) -> Self {
        self.require_confirmation = true;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Follow the confirmation link: marks the account confirmed and returns the
    /// session the callback would observe.
    pub fn confirm_email(&self, email: &str) -> Result<Session, SessionError> {
        let user = {
            let mut accounts = self.lock();
            let account = accounts
                .by_email
                .get_mut(&normalize(email))
                .ok_or(SessionError::InvalidCredentials)?;
            account.confirmed = true;
            account.user.clone()
        };
        self.issue(user)
    }

    /// Finish a third-party sign-in for `email`, creating the account on first use.
    pub fn complete_oauth(&self, email: &str) -> Result<Session, SessionError> {
        let user = {
            let mut accounts = self.lock();
            let account = accounts.by_email.entry(normalize(email)).or_insert_with(|| Account {
                user: AuthUser {
                    id: UserId::new(),
                    email: email.trim().to_string(),
                },
                password: None,
                confirmed: true,
            });
            account.confirmed = true;
            account.user.clone()
        };
        self.issue(user)
    }

    pub fn confirmations_sent(&self, email: &str) -> usize {
        self.lock()
            .confirmations_sent
            .get(&normalize(email))
            .copied()
            .unwrap_or(0)
    }

    fn issue(&self, user: AuthUser) -> Result<Session, SessionError> {
        let (access_token, claims) = self
            .codec
            .issue(&user, Utc::now(), self.ttl)
            .map_err(|e| SessionError::Rejected {
                status: 500,
                message: e.to_string(),
            })?;
        Ok(Session {
            access_token,
            user,
            expires_at: Some(claims.exp),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Accounts> {
        self.accounts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        let user = {
            let accounts = self.lock();
            let account = accounts
                .by_email
                .get(&normalize(email))
                .filter(|a| a.password.as_deref() == Some(password))
                .ok_or(SessionError::InvalidCredentials)?;
            if !account.confirmed {
                return Err(SessionError::EmailNotConfirmed);
            }
            account.user.clone()
        };
        self.issue(user)
    }

    async fn sign_up(&self, email: &str, password: &str, _redirect_to: &str) -> Result<SignUpResult, SessionError> {
        if !email.contains('@') {
            return Err(SessionError::Rejected {
                status: 400,
                message: "Unable to validate email address: invalid format".to_string(),
            });
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(SessionError::Rejected {
                status: 422,
                message: format!("Password should be at least {MIN_PASSWORD_LEN} characters"),
            });
        }

        let key = normalize(email);
        let user = {
            let mut accounts = self.lock();
            if accounts.by_email.contains_key(&key) {
                return Err(SessionError::AlreadyRegistered);
            }
            let user = AuthUser {
                id: UserId::new(),
                email: email.trim().to_string(),
            };
            accounts.by_email.insert(
                key.clone(),
                Account {
                    user: user.clone(),
                    password: Some(password.to_string()),
                    confirmed: !self.require_confirmation,
                },
            );
            if self.require_confirmation {
                *accounts.confirmations_sent.entry(key).or_default() += 1;
            }
            user
        };

        if self.require_confirmation {
            return Ok(SignUpResult { user, session: None });
        }
        let session = self.issue(user.clone())?;
        Ok(SignUpResult {
            user,
            session: Some(session),
        })
    }

    async fn oauth_redirect(&self, provider: &OAuthProvider, redirect_to: &str) -> Result<OAuthRedirect, SessionError> {
        let url = Url::parse_with_params(
            "memory://auth/authorize",
            &[("provider", provider.as_str()), ("redirect_to", redirect_to)],
        )
        .map_err(|e| SessionError::Transport(e.to_string()))?;
        Ok(OAuthRedirect {
            provider: provider.clone(),
            url: url.to_string(),
        })
    }

    async fn resend_confirmation(&self, email: &str) -> Result<(), SessionError> {
        let key = normalize(email);
        let mut accounts = self.lock();
        let pending = accounts.by_email.get(&key).is_some_and(|a| !a.confirmed);
        // Unknown or already-confirmed addresses succeed silently.
        if pending {
            *accounts.confirmations_sent.entry(key).or_default() += 1;
        }
        Ok(())
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), SessionError> {
        self.lock().revoked.insert(token.as_str().to_string());
        Ok(())
    }

    async fn get_user(&self, token: &AccessToken) -> Result<AuthUser, SessionError> {
        if self.lock().revoked.contains(token.as_str()) {
            return Err(SessionError::InvalidToken);
        }
        let claims = self
            .codec
            .decode(token, Utc::now())
            .map_err(|_| SessionError::InvalidToken)?;
        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemorySessionStore {
        InMemorySessionStore::new(Hs256TokenCodec::new(b"session-test"))
    }

    #[tokio::test]
    async fn sign_up_then_sign_in_round_trips_the_user() {
        let store = store();
        let signed_up = store.sign_up("Jane@X.com", "secret1", "/auth/callback").await.unwrap();
        assert!(signed_up.session.is_some());

        let session = store.sign_in_with_password("jane@x.com", "secret1").await.unwrap();
        assert_eq!(session.user.id, signed_up.user.id);

        let user = store.get_user(&session.access_token).await.unwrap();
        assert_eq!(user.id, signed_up.user.id);
    }

    #[tokio::test]
    async fn wrong_password_and_duplicate_email_are_classified() {
        let store = store();
        store.sign_up("a@x.com", "secret1", "/cb").await.unwrap();

        assert_eq!(
            store.sign_in_with_password("a@x.com", "nope").await.unwrap_err(),
            SessionError::InvalidCredentials
        );
        assert_eq!(
            store.sign_up("a@x.com", "secret2", "/cb").await.unwrap_err(),
            SessionError::AlreadyRegistered
        );
        assert!(matches!(
            store.sign_up("b@x.com", "123", "/cb").await.unwrap_err(),
            SessionError::Rejected { status: 422, .. }
        ));
    }

    #[tokio::test]
    async fn unconfirmed_account_cannot_sign_in_until_confirmed() {
        let store = store().with_email_confirmation();
        let result = store.sign_up("c@x.com", "secret1", "/cb").await.unwrap();
        assert!(result.session.is_none());
        assert_eq!(store.confirmations_sent("c@x.com"), 1);

        assert_eq!(
            store.sign_in_with_password("c@x.com", "secret1").await.unwrap_err(),
            SessionError::EmailNotConfirmed
        );

        store.resend_confirmation("c@x.com").await.unwrap();
        store.resend_confirmation("c@x.com").await.unwrap();
        assert_eq!(store.confirmations_sent("c@x.com"), 3);

        store.confirm_email("c@x.com").unwrap();
        assert!(store.sign_in_with_password("c@x.com", "secret1").await.is_ok());
    }

    #[tokio::test]
    async fn signed_out_token_is_rejected() {
        let store = store();
        let session = store.complete_oauth("oauth@x.com").unwrap();
        store.sign_out(&session.access_token).await.unwrap();
        assert_eq!(
            store.get_user(&session.access_token).await.unwrap_err(),
            SessionError::InvalidToken
        );
    }

    #[tokio::test]
    async fn expired_session_token_is_rejected() {
        let store = store().with_ttl(Duration::seconds(-60));
        let session = store.complete_oauth("old@x.com").unwrap();
        assert_eq!(
            store.get_user(&session.access_token).await.unwrap_err(),
            SessionError::InvalidToken
        );
    }

    #[tokio::test]
    async fn oauth_redirect_carries_provider_and_target() {
        let redirect = store()
            .oauth_redirect(&OAuthProvider::GOOGLE, "http://localhost:3000/auth/callback")
            .await
            .unwrap();
        assert!(redirect.url.contains("provider=google"));
        assert!(redirect.url.contains("redirect_to=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback"));
    }
}
