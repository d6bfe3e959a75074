//! First-login provisioning: the role row, then the matching profile row.
//!
//! The two inserts are not transactional. When the profile insert fails after
//! the role insert succeeded the user is left with a role and no profile; the
//! data access layer reports that as "profile missing" until provisioning is
//! retried.
//!
//! A retry resumes instead of duplicating:
//!
//! ```text
//! insert user_roles ── ok ──────────────────────────┐
//!        │                                          ▼
//!        └─ conflict → read existing ─ same role → insert profile ─ ok → done
//!                            │                          │
//!                            └─ other role → RoleConflict
//!                                                       └─ conflict → read existing profile → done
//! ```

use thiserror::Error;

use gradeportal_auth::Role;
use gradeportal_core::UserId;
use gradeportal_records::{NewStudent, NewTeacher, Profile, ProfileName, UserRoleRow};

use crate::store::{Caller, PolicyStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProvisionError {
    #[error("{0}")]
    Validation(String),

    #[error("user already has role {existing}, cannot provision as {requested}")]
    RoleConflict { existing: Role, requested: Role },

    #[error("failed to set user role: {0}")]
    RoleWrite(StoreError),

    #[error("failed to create {role} profile: {source}")]
    ProfileWrite { role: Role, source: StoreError },
}

#[derive(Debug, Clone)]
pub struct Provisioner<S> {
    store: S,
}

impl<S: PolicyStore> Provisioner<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create the role row and profile for `user_id`. `name` must not be blank.
    ///
    /// Safe to call again with the same role after a partial failure.
    pub async fn provision(
        &self,
        caller: &Caller,
        user_id: UserId,
        role: Role,
        name: &str,
        email: &str,
    ) -> Result<Profile, ProvisionError> {
        let name = ProfileName::new(name).map_err(|e| ProvisionError::Validation(e.to_string()))?;

        self.ensure_role(caller, user_id, role).await?;

        let profile = match role {
            Role::Student => self.create_student(caller, user_id, name).await?,
            Role::Teacher => self.create_teacher(caller, user_id, name).await?,
        };
        tracing::info!(%user_id, %role, email, "user provisioned");
        Ok(profile)
    }

    async fn ensure_role(&self, caller: &Caller, user_id: UserId, role: Role) -> Result<(), ProvisionError> {
        match self.store.insert_user_role(caller, UserRoleRow { user_id, role }).await {
            Ok(()) => Ok(()),
            Err(StoreError::Conflict(_)) => {
                let existing = self
                    .store
                    .find_user_role(caller, user_id)
                    .await
                    .map_err(ProvisionError::RoleWrite)?;
                if existing.role != role {
                    return Err(ProvisionError::RoleConflict {
                        existing: existing.role,
                        requested: role,
                    });
                }
                tracing::warn!(%user_id, %role, "role already assigned; resuming provisioning");
                Ok(())
            }
            Err(e) => Err(ProvisionError::RoleWrite(e)),
        }
    }

    async fn create_student(&self, caller: &Caller, user_id: UserId, name: ProfileName) -> Result<Profile, ProvisionError> {
        let role = Role::Student;
        match self.store.insert_student(caller, &NewStudent::for_user(user_id, name)).await {
            Ok(record) => Ok(Profile::Student(record)),
            Err(StoreError::Conflict(_)) => self
                .store
                .find_student_by_user(caller, user_id)
                .await
                .map(Profile::Student)
                .map_err(|source| ProvisionError::ProfileWrite { role, source }),
            Err(source) => {
                tracing::warn!(%user_id, %role, error = %source, "role assigned but profile insert failed");
                Err(ProvisionError::ProfileWrite { role, source })
            }
        }
    }

    async fn create_teacher(&self, caller: &Caller, user_id: UserId, name: ProfileName) -> Result<Profile, ProvisionError> {
        let role = Role::Teacher;
        match self.store.insert_teacher(caller, &NewTeacher { user_id, name }).await {
            Ok(record) => Ok(Profile::Teacher(record)),
            Err(StoreError::Conflict(_)) => self
                .store
                .find_teacher_by_user(caller, user_id)
                .await
                .map(Profile::Teacher)
                .map_err(|source| ProvisionError::ProfileWrite { role, source }),
            Err(source) => {
                tracing::warn!(%user_id, %role, error = %source, "role assigned but profile insert failed");
                Err(ProvisionError::ProfileWrite { role, source })
            }
        }
    }
}
