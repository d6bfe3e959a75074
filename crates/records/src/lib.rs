//! Row types of the portal tables and the pure logic derived from them.
//!
//! `user_roles`, `students` and `teachers` are owned by the remote store; these
//! types only mirror the rows. No IO happens here.

pub mod dashboard;
pub mod marks;
pub mod profile;
pub mod student;
pub mod teacher;
pub mod user_role;

pub use dashboard::{DashboardView, PassStatus, StudentDashboard, StudentRow, TeacherDashboard};
pub use marks::{Grade, Marks};
pub use profile::{Profile, ProfileName};
pub use student::{DEFAULT_SUBJECT, MarksUpdate, NewStudent, StudentRecord};
pub use teacher::{NewTeacher, TeacherRecord};
pub use user_role::UserRoleRow;
