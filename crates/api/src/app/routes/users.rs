use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};

use crate::app::Accounts;
use crate::app::dto::{MessageResponse, SETUP_COMPLETED, SetupUserRequest, UserRoleResponse};
use crate::app::errors;
use crate::context::RequestUser;

pub async fn setup_user(
    State(accounts): State<Arc<Accounts>>,
    caller: RequestUser,
    body: Result<Json<SetupUserRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::invalid_body(rejection.body_text()),
    };

    match accounts.setup_user(caller.user(), &request).await {
        Ok(_) => Json(MessageResponse {
            message: SETUP_COMPLETED,
        })
        .into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn user_role(State(accounts): State<Arc<Accounts>>, caller: RequestUser) -> Response {
    match accounts.user_role(caller.user()).await {
        Ok(role) => Json(UserRoleResponse { role }).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}
