//! Role-gated reads and the marks update.
//!
//! Identifier filters here only narrow the query. Whether a row may be read or
//! written is the store's decision; its refusals come back as
//! [`DataAccessError::Forbidden`].

use thiserror::Error;

use gradeportal_core::{RecordId, UserId};
use gradeportal_records::{Marks, MarksUpdate, StudentRecord, TeacherRecord};

use crate::store::{Caller, PolicyStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataAccessError {
    /// Rejected locally; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// Role assigned but no profile row (interrupted provisioning).
    #[error("profile missing")]
    ProfileMissing,

    #[error("student record {0} not found")]
    RecordNotFound(RecordId),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error(transparent)]
    Store(StoreError),
}

impl DataAccessError {
    fn from_store(err: StoreError, not_found: DataAccessError) -> Self {
        match err {
            StoreError::NotFound => not_found,
            StoreError::PolicyRejected(msg) => DataAccessError::Forbidden(msg),
            StoreError::Unauthenticated(msg) => DataAccessError::Unauthenticated(msg),
            other => DataAccessError::Store(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataAccess<S> {
    store: S,
}

impl<S: PolicyStore> DataAccess<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn get_own_record(&self, caller: &Caller, user_id: UserId) -> Result<StudentRecord, DataAccessError> {
        self.store
            .find_student_by_user(caller, user_id)
            .await
            .map_err(|e| DataAccessError::from_store(e, DataAccessError::ProfileMissing))
    }

    /// Every student row, by name. Teachers only; anyone else gets `Forbidden`.
    pub async fn get_all_records(&self, caller: &Caller) -> Result<Vec<StudentRecord>, DataAccessError> {
        self.store.list_students(caller).await.map_err(|e| {
            if matches!(e, StoreError::PolicyRejected(_)) {
                tracing::warn!(error = %e, "student list refused");
            }
            DataAccessError::from_store(e, DataAccessError::ProfileMissing)
        })
    }

    pub async fn update_marks(
        &self,
        caller: &Caller,
        record_id: RecordId,
        marks: i64,
    ) -> Result<StudentRecord, DataAccessError> {
        let marks = Marks::new(marks).map_err(|e| DataAccessError::Validation(e.to_string()))?;

        let updated = self
            .store
            .update_student_marks(caller, record_id, MarksUpdate { marks })
            .await
            .map_err(|e| {
                if matches!(e, StoreError::PolicyRejected(_)) {
                    tracing::warn!(%record_id, error = %e, "marks update refused");
                }
                DataAccessError::from_store(e, DataAccessError::RecordNotFound(record_id))
            })?;
        tracing::info!(%record_id, %marks, "marks updated");
        Ok(updated)
    }

    pub async fn get_teacher_profile(&self, caller: &Caller, user_id: UserId) -> Result<TeacherRecord, DataAccessError> {
        self.store
            .find_teacher_by_user(caller, user_id)
            .await
            .map_err(|e| DataAccessError::from_store(e, DataAccessError::ProfileMissing))
    }
}
