//! Contract of the policy-enforced data store.
//!
//! Every call carries a [`Caller`]. The store decides, per row, what that caller
//! may read or write; adapters never filter for security themselves.

pub mod in_memory;
pub mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use gradeportal_auth::AccessToken;
use gradeportal_core::{RecordId, UserId};
use gradeportal_records::{MarksUpdate, NewStudent, NewTeacher, StudentRecord, TeacherRecord, UserRoleRow};

pub use in_memory::InMemoryPolicyStore;
pub use rest::RestPolicyStore;

/// Who a store request is made on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// An end user; row policies apply to the token's subject.
    User(AccessToken),
    /// The server's service credential; row policies are bypassed.
    Service,
}

/// Store failure, close to what the store reported.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The single-row query matched nothing (or nothing visible to the caller).
    #[error("no rows found")]
    NotFound,

    /// A row policy or grant blocked the operation.
    #[error("permission denied: {0}")]
    PolicyRejected(String),

    /// The credential itself was refused (expired or malformed token).
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Unique constraint violated.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store rejected request ({status}): {message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("store unreachable: {0}")]
    Transport(String),

    #[error("unexpected store response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// `NotFound` when the user has no role row.
    async fn find_user_role(&self, caller: &Caller, user_id: UserId) -> Result<UserRoleRow, StoreError>;

    /// `Conflict` when the user already has a role row.
    async fn insert_user_role(&self, caller: &Caller, row: UserRoleRow) -> Result<(), StoreError>;

    async fn find_student_by_user(&self, caller: &Caller, user_id: UserId) -> Result<StudentRecord, StoreError>;

    /// All student rows ordered by name.
    async fn list_students(&self, caller: &Caller) -> Result<Vec<StudentRecord>, StoreError>;

    async fn insert_student(&self, caller: &Caller, row: &NewStudent) -> Result<StudentRecord, StoreError>;

    async fn update_student_marks(
        &self,
        caller: &Caller,
        id: RecordId,
        update: MarksUpdate,
    ) -> Result<StudentRecord, StoreError>;

    async fn find_teacher_by_user(&self, caller: &Caller, user_id: UserId) -> Result<TeacherRecord, StoreError>;

    async fn insert_teacher(&self, caller: &Caller, row: &NewTeacher) -> Result<TeacherRecord, StoreError>;
}

#[async_trait]
impl<S> PolicyStore for Arc<S>
where
    S: PolicyStore + ?Sized,
{
    async fn find_user_role(&self, caller: &Caller, user_id: UserId) -> Result<UserRoleRow, StoreError> {
        (**self).find_user_role(caller, user_id).await
    }

    async fn insert_user_role(&self, caller: &Caller, row: UserRoleRow) -> Result<(), StoreError> {
        (**self).insert_user_role(caller, row).await
    }

    async fn find_student_by_user(&self, caller: &Caller, user_id: UserId) -> Result<StudentRecord, StoreError> {
        (**self).find_student_by_user(caller, user_id).await
    }

    async fn list_students(&self, caller: &Caller) -> Result<Vec<StudentRecord>, StoreError> {
        (**self).list_students(caller).await
    }

    async fn insert_student(&self, caller: &Caller, row: &NewStudent) -> Result<StudentRecord, StoreError> {
        (**self).insert_student(caller, row).await
    }

    async fn update_student_marks(
        &self,
        caller: &Caller,
        id: RecordId,
        update: MarksUpdate,
    ) -> Result<StudentRecord, StoreError> {
        (**self).update_student_marks(caller, id, update).await
    }

    async fn find_teacher_by_user(&self, caller: &Caller, user_id: UserId) -> Result<TeacherRecord, StoreError> {
        (**self).find_teacher_by_user(caller, user_id).await
    }

    async fn insert_teacher(&self, caller: &Caller, row: &NewTeacher) -> Result<TeacherRecord, StoreError> {
        (**self).insert_teacher(caller, row).await
    }
}
