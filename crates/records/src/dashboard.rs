//! Dashboard view model.
//!
//! Everything the presentation layer needs to render the student or teacher
//! dashboard, already computed. No markup.

use serde::Serialize;

use gradeportal_core::{Entity, RecordId};

use crate::profile::initial_of;
use crate::{Grade, StudentRecord};

pub const STUDENT_TITLE: &str = "My Dashboard";
pub const STUDENT_SUBTITLE: &str = "View your academic progress and marks";
pub const TEACHER_TITLE: &str = "All Students";
pub const TEACHER_SUBTITLE: &str = "View and manage all student data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PassStatus {
    Pass,
    Fail,
}

impl PassStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PassStatus::Pass => "Pass",
            PassStatus::Fail => "Fail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentDashboard {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub name: String,
    pub initial: char,
    pub subject: String,
    /// e.g. `"0/100"`.
    pub marks_display: String,
    pub grade: Grade,
    pub status: PassStatus,
}

/// One line of the teacher's student list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentRow {
    pub id: RecordId,
    pub name: String,
    pub initial: char,
    pub subject: String,
    pub marks: u8,
    pub grade: Grade,
    pub status: PassStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeacherDashboard {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub students: Vec<StudentRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum DashboardView {
    Student(StudentDashboard),
    Teacher(TeacherDashboard),
}

impl DashboardView {
    pub fn for_student(record: &StudentRecord) -> Self {
        DashboardView::Student(StudentDashboard {
            title: STUDENT_TITLE,
            subtitle: STUDENT_SUBTITLE,
            name: record.name.clone(),
            initial: initial_of(&record.name),
            subject: record.subject.clone(),
            marks_display: record.marks.out_of_max(),
            grade: record.grade(),
            status: status_of(record),
        })
    }

    /// Rows keep the order they were fetched in (by name).
    pub fn for_teacher(records: &[StudentRecord]) -> Self {
        DashboardView::Teacher(TeacherDashboard {
            title: TEACHER_TITLE,
            subtitle: TEACHER_SUBTITLE,
            students: records.iter().map(StudentRow::from).collect(),
        })
    }

    pub fn title(&self) -> &'static str {
        match self {
            DashboardView::Student(s) => s.title,
            DashboardView::Teacher(t) => t.title,
        }
    }
}

impl From<&StudentRecord> for StudentRow {
    fn from(record: &StudentRecord) -> Self {
        Self {
            id: *record.id(),
            name: record.name.clone(),
            initial: initial_of(&record.name),
            subject: record.subject.clone(),
            marks: record.marks.value(),
            grade: record.grade(),
            status: status_of(record),
        }
    }
}

fn status_of(record: &StudentRecord) -> PassStatus {
    if record.marks.is_pass() {
        PassStatus::Pass
    } else {
        PassStatus::Fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_SUBJECT, Marks};
    use gradeportal_core::UserId;

    fn student(name: &str, marks: i64) -> StudentRecord {
        StudentRecord {
            id: RecordId::new(),
            user_id: UserId::new(),
            name: name.to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
            marks: Marks::new(marks).unwrap(),
        }
    }

    #[test]
    fn fresh_student_sees_zero_and_f() {
        let view = DashboardView::for_student(&student("jane", 0));
        let DashboardView::Student(s) = view else {
            panic!("expected student view");
        };
        assert_eq!(s.title, "My Dashboard");
        assert_eq!(s.marks_display, "0/100");
        assert_eq!(s.grade, Grade::F);
        assert_eq!(s.status, PassStatus::Fail);
        assert_eq!(s.initial, 'J');
    }

    #[test]
    fn teacher_view_lists_every_student() {
        let rows = vec![student("Adam", 95), student("Jane", 61)];
        let view = DashboardView::for_teacher(&rows);
        assert_eq!(view.title(), "All Students");

        let DashboardView::Teacher(t) = view else {
            panic!("expected teacher view");
        };
        assert_eq!(t.students.len(), 2);
        assert_eq!(t.students[0].grade.label(), "A+");
        assert_eq!(t.students[1].status.label(), "Pass");
    }
}
