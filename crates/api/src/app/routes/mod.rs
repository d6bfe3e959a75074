use axum::{
    Router,
    routing::{get, post},
};

use super::AppState;
use super::errors::method_not_allowed;

pub mod system;
pub mod users;

/// Router for the token-authenticated endpoints.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/setup-user", post(users::setup_user).fallback(method_not_allowed))
        .route("/user-role", get(users::user_role).fallback(method_not_allowed))
}
