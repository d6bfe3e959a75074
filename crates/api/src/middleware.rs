use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, Request, StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};

use gradeportal_auth::{AccessToken, SessionError, SessionStore};

use crate::app::errors::json_error;
use crate::context::RequestUser;

#[derive(Clone)]
pub struct AuthState {
    pub sessions: Arc<dyn SessionStore>,
}

/// Bearer-token authentication as an extractor.
///
/// Runs per handler rather than as a router layer, so a request with the wrong
/// method is answered 405 before its token is looked at.
#[async_trait]
impl<S> FromRequestParts<S> for RequestUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_bearer(&parts.headers) else {
            return Err(json_error(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "No authorization token provided",
            ));
        };
        let token = AccessToken::new(token);

        let auth = AuthState::from_ref(state);
        match auth.sessions.get_user(&token).await {
            Ok(user) => Ok(RequestUser::new(user, token)),
            Err(e) => {
                if matches!(e, SessionError::Transport(_)) {
                    tracing::warn!(error = %e, "token verification could not reach the session store");
                }
                Err(json_error(StatusCode::UNAUTHORIZED, "unauthorized", "Invalid token"))
            }
        }
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let token = header.to_str().ok()?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

/// One log line per request.
pub async fn log_requests(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = next.run(req).await;
    tracing::info!(%method, %path, status = response.status().as_u16(), "request handled");
    response
}
