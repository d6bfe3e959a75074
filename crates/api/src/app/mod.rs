//! HTTP application wiring (Axum router + shared state).
//!
//! - `routes/`: handlers, one file per area
//! - `dto.rs`: response bodies
//! - `errors.rs`: JSON error responses

use std::sync::Arc;

use axum::{Router, extract::FromRef, routing::get};
use tower::ServiceBuilder;

use gradeportal_auth::SessionStore;
use gradeportal_infra::services::AccountService;
use gradeportal_infra::store::PolicyStore;

use crate::middleware::{self, AuthState};

pub mod dto;
pub mod errors;
pub mod routes;

pub type Accounts = AccountService<Arc<dyn PolicyStore>>;

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub accounts: Arc<Accounts>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for Arc<Accounts> {
    fn from_ref(state: &AppState) -> Self {
        state.accounts.clone()
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// `sessions` verifies bearer tokens; `store` is reached with the service
/// credential.
pub fn build_app(sessions: Arc<dyn SessionStore>, store: Arc<dyn PolicyStore>) -> Router {
    let state = AppState {
        auth: AuthState { sessions },
        accounts: Arc::new(AccountService::new(store)),
    };

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .with_state(state)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::log_requests)))
}
