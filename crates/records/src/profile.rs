use serde::{Deserialize, Serialize};

use gradeportal_core::{DomainError, DomainResult, ValueObject};

use crate::{StudentRecord, TeacherRecord};

/// Display name entered at provisioning. Trimmed, never blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProfileName(String);

impl ProfileName {
    pub fn new(name: &str) -> DomainResult<Self> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("name must not be blank"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Upper-cased first character, used for avatar badges.
    pub fn initial(&self) -> char {
        initial_of(&self.0)
    }
}

impl ValueObject for ProfileName {}

impl TryFrom<String> for ProfileName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ProfileName::new(&value)
    }
}

impl From<ProfileName> for String {
    fn from(value: ProfileName) -> Self {
        value.0
    }
}

impl core::fmt::Display for ProfileName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

pub(crate) fn initial_of(name: &str) -> char {
    name.chars()
        .next()
        .and_then(|c| c.to_uppercase().next())
        .unwrap_or('?')
}

/// The role-specific profile row created at provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Profile {
    Student(StudentRecord),
    Teacher(TeacherRecord),
}
