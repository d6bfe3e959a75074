use thiserror::Error;

use gradeportal_auth::Role;
use gradeportal_core::UserId;

use crate::store::{Caller, PolicyStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoleError {
    /// The user has no `user_roles` row yet; route to role selection.
    #[error("no role assigned")]
    NotSet,

    #[error(transparent)]
    Store(StoreError),
}

/// Maps a user id to their role.
#[derive(Debug, Clone)]
pub struct RoleResolver<S> {
    store: S,
}

impl<S: PolicyStore> RoleResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn get_role(&self, caller: &Caller, user_id: UserId) -> Result<Role, RoleError> {
        tracing::debug!(%user_id, "resolving role");
        match self.store.find_user_role(caller, user_id).await {
            Ok(row) => Ok(row.role),
            Err(StoreError::NotFound) => Err(RoleError::NotSet),
            Err(e) => Err(RoleError::Store(e)),
        }
    }
}
