//! Auth Gateway: the single entry point for sign-in/up/out.
//!
//! The gateway owns the current session (if any). All credential checks are
//! delegated to the [`SessionStore`].

use std::sync::{Arc, Mutex, MutexGuard};

use crate::{AccessToken, AuthUser, OAuthProvider, OAuthRedirect, Session, SessionError, SessionStore};

/// Result of a password sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    SignedIn(Session),
    /// The account is unconfirmed. Recoverable: offer the resend action.
    ConfirmationRequired(ResendConfirmation),
}

/// Result of a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    SessionEstablished(Session),
    /// No session yet; provisioning must wait for the confirmation callback.
    ConfirmationPending(AuthUser),
}

/// Deferred "send the confirmation email again" action handed out on an
/// unconfirmed sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResendConfirmation {
    email: String,
}

impl ResendConfirmation {
    pub fn email(&self) -> &str {
        &self.email
    }

    pub async fn send(&self, gateway: &AuthGateway) -> Result<(), SessionError> {
        gateway.resend_confirmation(&self.email).await
    }
}

pub struct AuthGateway {
    store: Arc<dyn SessionStore>,
    current: Mutex<Option<Session>>,
}

impl AuthGateway {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            current: Mutex::new(None),
        }
    }

    pub fn current_session(&self) -> Option<Session> {
        self.slot().clone()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome, SessionError> {
        match self.store.sign_in_with_password(email, password).await {
            Ok(session) => {
                tracing::info!(user_id = %session.user.id, "signed in");
                *self.slot() = Some(session.clone());
                Ok(SignInOutcome::SignedIn(session))
            }
            Err(SessionError::EmailNotConfirmed) => {
                tracing::info!("sign-in blocked: email not confirmed");
                Ok(SignInOutcome::ConfirmationRequired(ResendConfirmation {
                    email: email.to_string(),
                }))
            }
            Err(e) => Err(e),
        }
    }

    /// Register a new account. Creates no role and no profile.
    pub async fn sign_up(&self, email: &str, password: &str, redirect_to: &str) -> Result<SignUpOutcome, SessionError> {
        let result = self.store.sign_up(email, password, redirect_to).await?;
        match result.session {
            Some(session) => {
                tracing::info!(user_id = %session.user.id, "signed up with immediate session");
                *self.slot() = Some(session.clone());
                Ok(SignUpOutcome::SessionEstablished(session))
            }
            None => {
                tracing::info!(user_id = %result.user.id, "signed up; confirmation pending");
                Ok(SignUpOutcome::ConfirmationPending(result.user))
            }
        }
    }

    /// Start a third-party sign-in. The session shows up later at the callback,
    /// see [`AuthGateway::adopt_session`].
    pub async fn sign_in_with_oauth(&self, provider: &OAuthProvider, redirect_to: &str) -> Result<OAuthRedirect, SessionError> {
        self.store.oauth_redirect(provider, redirect_to).await
    }

    /// Install a session that materialized out-of-band (OAuth or email-link callback).
    pub fn adopt_session(&self, session: Session) {
        *self.slot() = Some(session);
    }

    pub async fn resend_confirmation(&self, email: &str) -> Result<(), SessionError> {
        self.store.resend_confirmation(email).await
    }

    /// Drop the local session and revoke it remotely. Signing out without a
    /// session is a no-op.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        let previous = self.slot().take();
        match previous {
            Some(session) => self.store.sign_out(&session.access_token).await,
            None => Ok(()),
        }
    }

    pub async fn verify_token(&self, token: &AccessToken) -> Result<AuthUser, SessionError> {
        self.store.get_user(token).await
    }

    fn slot(&self) -> MutexGuard<'_, Option<Session>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gradeportal_core::UserId;

    use crate::SignUpResult;

    /// Scripted store: one fixed account, optionally unconfirmed.
    struct Scripted {
        confirmed: bool,
        defer_signup_session: bool,
        user: AuthUser,
        resent: Mutex<u32>,
        signed_out: Mutex<u32>,
    }

    impl Scripted {
        fn new(confirmed: bool) -> Self {
            Self {
                confirmed,
                defer_signup_session: false,
                user: AuthUser {
                    id: UserId::new(),
                    email: "jane@x.com".to_string(),
                },
                resent: Mutex::new(0),
                signed_out: Mutex::new(0),
            }
        }

        fn session(&self) -> Session {
            Session {
                access_token: AccessToken::new("tok"),
                user: self.user.clone(),
                expires_at: None,
            }
        }
    }

    #[async_trait]
    impl SessionStore for Scripted {
        async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, SessionError> {
            if email != self.user.email || password != "pw" {
                return Err(SessionError::InvalidCredentials);
            }
            if !self.confirmed {
                return Err(SessionError::EmailNotConfirmed);
            }
            Ok(self.session())
        }

        async fn sign_up(&self, _email: &str, _password: &str, _redirect_to: &str) -> Result<SignUpResult, SessionError> {
            Ok(SignUpResult {
                user: self.user.clone(),
                session: (!self.defer_signup_session).then(|| self.session()),
            })
        }

        async fn oauth_redirect(&self, provider: &OAuthProvider, redirect_to: &str) -> Result<OAuthRedirect, SessionError> {
            Ok(OAuthRedirect {
                provider: provider.clone(),
                url: format!("https://auth.example/authorize?provider={provider}&redirect_to={redirect_to}"),
            })
        }

        async fn resend_confirmation(&self, _email: &str) -> Result<(), SessionError> {
            *self.resent.lock().unwrap() += 1;
            Ok(())
        }

        async fn sign_out(&self, _token: &AccessToken) -> Result<(), SessionError> {
            *self.signed_out.lock().unwrap() += 1;
            Ok(())
        }

        async fn get_user(&self, token: &AccessToken) -> Result<AuthUser, SessionError> {
            if token.as_str() == "tok" {
                Ok(self.user.clone())
            } else {
                Err(SessionError::InvalidToken)
            }
        }
    }

    #[tokio::test]
    async fn sign_in_stores_session() {
        let gw = AuthGateway::new(Arc::new(Scripted::new(true)));
        let outcome = gw.sign_in("jane@x.com", "pw").await.unwrap();
        assert!(matches!(outcome, SignInOutcome::SignedIn(_)));
        assert!(gw.current_session().is_some());
    }

    #[tokio::test]
    async fn unconfirmed_email_yields_resend_action_not_error() {
        let store = Arc::new(Scripted::new(false));
        let gw = AuthGateway::new(store.clone());

        let outcome = gw.sign_in("jane@x.com", "pw").await.unwrap();
        let resend = match outcome {
            SignInOutcome::ConfirmationRequired(r) => r,
            other => panic!("expected confirmation state, got {other:?}"),
        };
        assert_eq!(resend.email(), "jane@x.com");
        assert!(gw.current_session().is_none());

        resend.send(&gw).await.unwrap();
        resend.send(&gw).await.unwrap();
        assert_eq!(*store.resent.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn bad_password_is_an_error() {
        let gw = AuthGateway::new(Arc::new(Scripted::new(true)));
        assert_eq!(
            gw.sign_in("jane@x.com", "nope").await.unwrap_err(),
            SessionError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn deferred_signup_has_no_session() {
        let mut store = Scripted::new(false);
        store.defer_signup_session = true;
        let gw = AuthGateway::new(Arc::new(store));

        let outcome = gw.sign_up("jane@x.com", "pw", "http://localhost/auth/callback").await.unwrap();
        assert!(matches!(outcome, SignUpOutcome::ConfirmationPending(_)));
        assert!(gw.current_session().is_none());
    }

    #[tokio::test]
    async fn sign_out_clears_session_and_is_idempotent() {
        let store = Arc::new(Scripted::new(true));
        let gw = AuthGateway::new(store.clone());
        gw.sign_in("jane@x.com", "pw").await.unwrap();

        gw.sign_out().await.unwrap();
        gw.sign_out().await.unwrap();
        assert!(gw.current_session().is_none());
        assert_eq!(*store.signed_out.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn oauth_returns_redirect_and_adopt_installs_session() {
        let store = Arc::new(Scripted::new(true));
        let gw = AuthGateway::new(store.clone());

        let redirect = gw
            .sign_in_with_oauth(&OAuthProvider::GOOGLE, "http://localhost/auth/callback")
            .await
            .unwrap();
        assert!(redirect.url.contains("provider=google"));
        assert!(gw.current_session().is_none());

        gw.adopt_session(store.session());
        assert_eq!(gw.current_session().unwrap().user, store.user);
    }
}
