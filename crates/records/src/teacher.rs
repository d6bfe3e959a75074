use serde::{Deserialize, Serialize};

use gradeportal_core::{Entity, RecordId, UserId};

use crate::ProfileName;

/// Row of `teachers`. Never changes after provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherRecord {
    pub id: RecordId,
    pub user_id: UserId,
    pub name: String,
}

impl Entity for TeacherRecord {
    type Id = RecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTeacher {
    pub user_id: UserId,
    pub name: ProfileName,
}
