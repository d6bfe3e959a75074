//! Server-side account setup, behind `POST /setup-user` and `GET /user-role`.
//!
//! The caller's token has already been verified; the service acts with the
//! service credential on that user's behalf.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gradeportal_auth::{AuthUser, Role};
use gradeportal_records::Profile;

use super::{ProvisionError, Provisioner, RoleError, RoleResolver};
use crate::store::{Caller, PolicyStore, StoreError};

/// Body of `POST /setup-user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupUserRequest {
    pub role: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("user role not found")]
    NoRole,

    #[error(transparent)]
    Provisioning(#[from] ProvisionError),

    #[error(transparent)]
    Store(StoreError),
}

#[derive(Debug, Clone)]
pub struct AccountService<S> {
    roles: RoleResolver<S>,
    provisioner: Provisioner<S>,
}

impl<S: PolicyStore + Clone> AccountService<S> {
    pub fn new(store: S) -> Self {
        Self {
            roles: RoleResolver::new(store.clone()),
            provisioner: Provisioner::new(store),
        }
    }

    /// Assign `request.role` to `user` and create the matching profile.
    pub async fn setup_user(&self, user: &AuthUser, request: &SetupUserRequest) -> Result<Profile, AccountError> {
        let role = Role::from_str(&request.role).map_err(|e| ProvisionError::Validation(e.to_string()))?;
        let email = if request.email.is_empty() {
            user.email.as_str()
        } else {
            request.email.as_str()
        };
        let profile = self
            .provisioner
            .provision(&Caller::Service, user.id, role, &request.name, email)
            .await?;
        Ok(profile)
    }

    pub async fn user_role(&self, user: &AuthUser) -> Result<Role, AccountError> {
        self.roles
            .get_role(&Caller::Service, user.id)
            .await
            .map_err(|e| match e {
                RoleError::NotSet => AccountError::NoRole,
                RoleError::Store(e) => AccountError::Store(e),
            })
    }
}
