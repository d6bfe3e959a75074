use serde::{Deserialize, Serialize};

use gradeportal_auth::Role;
use gradeportal_core::UserId;

/// Row of `user_roles`. At most one per user, never updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoleRow {
    pub user_id: UserId,
    pub role: Role,
}
