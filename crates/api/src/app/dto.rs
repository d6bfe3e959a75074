use serde::Serialize;

use gradeportal_auth::Role;

pub use gradeportal_infra::services::SetupUserRequest;

pub const SETUP_COMPLETED: &str = "User setup completed successfully";

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UserRoleResponse {
    pub role: Role,
}
