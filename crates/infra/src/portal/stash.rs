//! Sign-up details parked across a redirect.
//!
//! When sign-up cannot provision right away (OAuth, or email confirmation
//! pending) the role and name are stashed and picked up once, at the callback.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gradeportal_auth::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSignup {
    pub role: Role,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum StashError {
    #[error("stash i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stashed signup unreadable: {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub trait SignupStash: Send + Sync {
    /// Replaces whatever was stashed before.
    fn put(&self, pending: &PendingSignup) -> Result<(), StashError>;

    /// Remove and return the stashed signup. The entry is gone afterwards even
    /// when it could not be read.
    fn take(&self) -> Result<Option<PendingSignup>, StashError>;
}

#[derive(Debug, Default)]
pub struct InMemorySignupStash {
    slot: Mutex<Option<PendingSignup>>,
}

impl InMemorySignupStash {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<PendingSignup>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SignupStash for InMemorySignupStash {
    fn put(&self, pending: &PendingSignup) -> Result<(), StashError> {
        *self.slot() = Some(pending.clone());
        Ok(())
    }

    fn take(&self) -> Result<Option<PendingSignup>, StashError> {
        Ok(self.slot().take())
    }
}

/// Stash kept in a JSON file, so it survives the process leaving for the
/// provider and coming back.
#[derive(Debug, Clone)]
pub struct FileSignupStash {
    path: PathBuf,
}

impl FileSignupStash {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SignupStash for FileSignupStash {
    fn put(&self, pending: &PendingSignup) -> Result<(), StashError> {
        fs::write(&self.path, serde_json::to_vec(pending)?)?;
        Ok(())
    }

    fn take(&self) -> Result<Option<PendingSignup>, StashError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        fs::remove_file(&self.path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> PendingSignup {
        PendingSignup {
            role: Role::Student,
            name: "Jane".to_string(),
            email: "jane@x.com".to_string(),
        }
    }

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("gradeportal-stash-{}.json", uuid::Uuid::now_v7()))
    }

    #[test]
    fn in_memory_take_empties_the_slot() {
        let stash = InMemorySignupStash::new();
        stash.put(&pending()).unwrap();
        assert_eq!(stash.take().unwrap(), Some(pending()));
        assert_eq!(stash.take().unwrap(), None);
    }

    #[test]
    fn file_stash_round_trip_and_single_use() {
        let stash = FileSignupStash::new(temp_path());
        assert!(stash.take().unwrap().is_none());

        stash.put(&pending()).unwrap();
        assert_eq!(stash.take().unwrap(), Some(pending()));
        assert!(stash.take().unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_discarded() {
        let path = temp_path();
        fs::write(&path, b"{not json").unwrap();
        let stash = FileSignupStash::new(&path);

        assert!(matches!(stash.take(), Err(StashError::Corrupt(_))));
        assert!(!path.exists());
    }
}
