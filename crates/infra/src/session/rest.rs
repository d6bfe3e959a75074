//! REST adapter for the hosted auth service (GoTrue dialect).

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use gradeportal_auth::{
    AccessToken, AuthUser, OAuthProvider, OAuthRedirect, Session, SessionError, SessionStore, SignUpResult,
};
use gradeportal_core::UserId;

use crate::config::PortalConfig;

pub struct RestSessionStore {
    client: Client,
    auth_url: String,
    anon_key: String,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
}

impl From<UserBody> for AuthUser {
    fn from(body: UserBody) -> Self {
        AuthUser {
            id: body.id,
            email: body.email.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    access_token: String,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: UserBody,
}

impl From<SessionBody> for Session {
    fn from(body: SessionBody) -> Self {
        let expires_at = body
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| body.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)));
        Session {
            access_token: AccessToken::new(body.access_token),
            user: body.user.into(),
            expires_at,
        }
    }
}

/// Sign-up answers with a session when confirmation is off, a bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpBody {
    Session(SessionBody),
    User(UserBody),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_code: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl RestSessionStore {
    pub fn new(store_url: &str, anon_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            auth_url: format!("{}/auth/v1", store_url.trim_end_matches('/')),
            anon_key: anon_key.into(),
        }
    }

    pub fn from_config(config: &PortalConfig) -> Self {
        Self::new(&config.store_url, config.anon_key.clone())
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/{}", self.auth_url, path))
            .header("apikey", &self.anon_key)
    }
}

async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, SessionError> {
    let response = send(request).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| SessionError::Transport(e.to_string()))
}

async fn send(request: RequestBuilder) -> Result<Response, SessionError> {
    let response = request
        .send()
        .await
        .map_err(|e| SessionError::Transport(e.to_string()))?;
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
    Err(classify(status, parsed, body))
}

fn classify(status: u16, body: ErrorBody, raw: String) -> SessionError {
    let code = body.error_code.or(body.error).unwrap_or_default();
    let message = body
        .msg
        .or(body.error_description)
        .or(body.message)
        .unwrap_or(raw);

    if code == "email_not_confirmed" || message.contains("Email not confirmed") {
        SessionError::EmailNotConfirmed
    } else if code == "invalid_credentials" || message.contains("Invalid login credentials") {
        SessionError::InvalidCredentials
    } else if code == "user_already_exists" || message.contains("already registered") {
        SessionError::AlreadyRegistered
    } else if code == "bad_jwt" || status == 401 || status == 403 {
        SessionError::InvalidToken
    } else {
        SessionError::Rejected { status, message }
    }
}

#[async_trait]
impl SessionStore for RestSessionStore {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        let body: SessionBody = fetch(
            self.post("token")
                .query(&[("grant_type", "password")])
                .json(&json!({ "email": email, "password": password })),
        )
        .await?;
        Ok(body.into())
    }

    async fn sign_up(&self, email: &str, password: &str, redirect_to: &str) -> Result<SignUpResult, SessionError> {
        let body: SignUpBody = fetch(
            self.post("signup")
                .query(&[("redirect_to", redirect_to)])
                .json(&json!({ "email": email, "password": password })),
        )
        .await?;
        Ok(match body {
            SignUpBody::Session(session) => {
                let session: Session = session.into();
                SignUpResult {
                    user: session.user.clone(),
                    session: Some(session),
                }
            }
            SignUpBody::User(user) => SignUpResult {
                user: user.into(),
                session: None,
            },
        })
    }

    async fn oauth_redirect(&self, provider: &OAuthProvider, redirect_to: &str) -> Result<OAuthRedirect, SessionError> {
        let url = Url::parse_with_params(
            &format!("{}/authorize", self.auth_url),
            &[("provider", provider.as_str()), ("redirect_to", redirect_to)],
        )
        .map_err(|e| SessionError::Transport(e.to_string()))?;
        Ok(OAuthRedirect {
            provider: provider.clone(),
            url: url.to_string(),
        })
    }

    async fn resend_confirmation(&self, email: &str) -> Result<(), SessionError> {
        send(self.post("resend").json(&json!({ "type": "signup", "email": email }))).await?;
        Ok(())
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), SessionError> {
        send(self.post("logout").bearer_auth(token.as_str())).await?;
        Ok(())
    }

    async fn get_user(&self, token: &AccessToken) -> Result<AuthUser, SessionError> {
        let body: UserBody = fetch(
            self.client
                .get(format!("{}/user", self.auth_url))
                .header("apikey", &self.anon_key)
                .bearer_auth(token.as_str()),
        )
        .await?;
        Ok(body.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::Value;

    use crate::test_support::StubServer;

    fn session_json(uid: UserId) -> Value {
        json!({
            "access_token": "jwt-123",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1_900_000_000,
            "refresh_token": "r",
            "user": { "id": uid.to_string(), "email": "jane@x.com" }
        })
    }

    #[tokio::test]
    async fn password_grant_parses_session() {
        let uid = UserId::new();
        let stub = StubServer::spawn(vec![(StatusCode::OK, session_json(uid))]).await;
        let store = RestSessionStore::new(&stub.base_url, "anon");

        let session = store.sign_in_with_password("jane@x.com", "secret1").await.unwrap();
        assert_eq!(session.user.id, uid);
        assert_eq!(session.access_token.as_str(), "jwt-123");
        assert_eq!(session.expires_at.map(|t| t.timestamp()), Some(1_900_000_000));

        let req = stub.request(0);
        assert_eq!(req.path, "/auth/v1/token");
        assert_eq!(req.query, "grant_type=password");
        assert_eq!(req.header("apikey"), Some("anon"));
        assert_eq!(req.body["email"], "jane@x.com");
    }

    #[tokio::test]
    async fn sign_up_distinguishes_immediate_and_deferred_session() {
        let uid = UserId::new();
        let stub = StubServer::spawn(vec![
            (StatusCode::OK, session_json(uid)),
            (StatusCode::OK, json!({ "id": uid.to_string(), "email": "jane@x.com" })),
        ])
        .await;
        let store = RestSessionStore::new(&stub.base_url, "anon");

        let immediate = store.sign_up("jane@x.com", "secret1", "http://app/cb").await.unwrap();
        assert!(immediate.session.is_some());

        let deferred = store.sign_up("jane@x.com", "secret1", "http://app/cb").await.unwrap();
        assert!(deferred.session.is_none());
        assert_eq!(deferred.user.id, uid);
        assert!(stub.request(1).query.starts_with("redirect_to="));
    }

    #[tokio::test]
    async fn error_bodies_are_classified() {
        let stub = StubServer::spawn(vec![
            (
                StatusCode::BAD_REQUEST,
                json!({ "code": 400, "error_code": "email_not_confirmed", "msg": "Email not confirmed" }),
            ),
            (
                StatusCode::BAD_REQUEST,
                json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" }),
            ),
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "code": 422, "error_code": "user_already_exists", "msg": "User already registered" }),
            ),
            (StatusCode::UNAUTHORIZED, json!({ "msg": "invalid JWT" })),
            (StatusCode::TOO_MANY_REQUESTS, json!({ "msg": "rate limit exceeded" })),
        ])
        .await;
        let store = RestSessionStore::new(&stub.base_url, "anon");

        assert_eq!(
            store.sign_in_with_password("a@x.com", "p").await.unwrap_err(),
            SessionError::EmailNotConfirmed
        );
        assert_eq!(
            store.sign_in_with_password("a@x.com", "p").await.unwrap_err(),
            SessionError::InvalidCredentials
        );
        assert_eq!(
            store.sign_up("a@x.com", "secret1", "/cb").await.unwrap_err(),
            SessionError::AlreadyRegistered
        );
        assert_eq!(
            store.get_user(&AccessToken::new("bad")).await.unwrap_err(),
            SessionError::InvalidToken
        );
        assert_eq!(
            store.resend_confirmation("a@x.com").await.unwrap_err(),
            SessionError::Rejected {
                status: 429,
                message: "rate limit exceeded".to_string()
            }
        );
    }

    #[tokio::test]
    async fn logout_sends_bearer_and_authorize_url_is_built_locally() {
        let stub = StubServer::spawn(vec![(StatusCode::NO_CONTENT, Value::Null)]).await;
        let store = RestSessionStore::new(&stub.base_url, "anon");

        store.sign_out(&AccessToken::new("jwt-123")).await.unwrap();
        assert_eq!(stub.request(0).header("authorization"), Some("Bearer jwt-123"));

        let redirect = store
            .oauth_redirect(&OAuthProvider::GOOGLE, "http://app/auth/callback")
            .await
            .unwrap();
        assert!(redirect.url.starts_with(&format!("{}/auth/v1/authorize?provider=google", stub.base_url)));
        assert_eq!(stub.request_count(), 1);
    }
}
