use serde::{Deserialize, Serialize};

use gradeportal_core::{Entity, RecordId, UserId};

use crate::{Marks, ProfileName};

/// Subject assigned to every newly provisioned student.
pub const DEFAULT_SUBJECT: &str = "Mathematics";

/// Row of `students`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: RecordId,
    pub user_id: UserId,
    pub name: String,
    pub subject: String,
    pub marks: Marks,
}

impl StudentRecord {
    pub fn grade(&self) -> crate::Grade {
        self.marks.grade()
    }
}

impl Entity for StudentRecord {
    type Id = RecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Insert payload for `students`; the store assigns `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub user_id: UserId,
    pub name: ProfileName,
    pub subject: String,
    pub marks: Marks,
}

impl NewStudent {
    /// Fresh profile: default subject, zero marks.
    pub fn for_user(user_id: UserId, name: ProfileName) -> Self {
        Self {
            user_id,
            name,
            subject: DEFAULT_SUBJECT.to_string(),
            marks: Marks::ZERO,
        }
    }
}

/// Patch body for a marks update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarksUpdate {
    pub marks: Marks,
}
