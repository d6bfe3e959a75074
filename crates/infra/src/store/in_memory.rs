//! In-memory stand-in for the policy-enforced store (dev/tests).
//!
//! Emulates the row policies the hosted database applies:
//! - `user_roles`: a user reads and inserts only their own row; one row per user.
//! - `students`: a student reads/inserts only their own row; a teacher reads all
//!   rows and is the only one who may update marks.
//! - `teachers`: a user reads and inserts only their own row.
//!
//! [`Caller::Service`] bypasses every policy, like the service key does.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use gradeportal_auth::{Hs256TokenCodec, Role};
use gradeportal_core::{RecordId, UserId};
use gradeportal_records::{MarksUpdate, NewStudent, NewTeacher, StudentRecord, TeacherRecord, UserRoleRow};

use super::{Caller, PolicyStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    user_roles: HashMap<UserId, Role>,
    students: HashMap<RecordId, StudentRecord>,
    teachers: HashMap<RecordId, TeacherRecord>,
}

impl Tables {
    fn is_teacher(&self, user_id: UserId) -> bool {
        self.user_roles.get(&user_id) == Some(&Role::Teacher)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Principal {
    Service,
    User(UserId),
}

pub struct InMemoryPolicyStore {
    codec: Hs256TokenCodec,
    tables: RwLock<Tables>,
    requests: AtomicUsize,
}

impl InMemoryPolicyStore {
    /// `codec` must be the one the session store signs tokens with.
    pub fn new(codec: Hs256TokenCodec) -> Self {
        Self {
            codec,
            tables: RwLock::new(Tables::default()),
            requests: AtomicUsize::new(0),
        }
    }

    /// Number of requests received so far, rejected ones included.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn principal(&self, caller: &Caller) -> Result<Principal, StoreError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match caller {
            Caller::Service => Ok(Principal::Service),
            Caller::User(token) => self
                .codec
                .decode(token, Utc::now())
                .map(|claims| Principal::User(claims.sub))
                .map_err(|e| StoreError::Unauthenticated(e.to_string())),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn owns(principal: Principal, user_id: UserId) -> bool {
    match principal {
        Principal::Service => true,
        Principal::User(id) => id == user_id,
    }
}

fn rls_violation(table: &str) -> StoreError {
    StoreError::PolicyRejected(format!("new row violates row-level security policy for table \"{table}\""))
}

fn permission_denied(table: &str) -> StoreError {
    StoreError::PolicyRejected(format!("permission denied for table {table}"))
}

fn duplicate(constraint: &str) -> StoreError {
    StoreError::Conflict(format!("duplicate key value violates unique constraint \"{constraint}\""))
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn find_user_role(&self, caller: &Caller, user_id: UserId) -> Result<UserRoleRow, StoreError> {
        let principal = self.principal(caller)?;
        if !owns(principal, user_id) {
            // Rows the policy hides are indistinguishable from missing rows.
            return Err(StoreError::NotFound);
        }
        self.read()
            .user_roles
            .get(&user_id)
            .map(|role| UserRoleRow { user_id, role: *role })
            .ok_or(StoreError::NotFound)
    }

    async fn insert_user_role(&self, caller: &Caller, row: UserRoleRow) -> Result<(), StoreError> {
        let principal = self.principal(caller)?;
        if !owns(principal, row.user_id) {
            return Err(rls_violation("user_roles"));
        }
        let mut tables = self.write();
        if tables.user_roles.contains_key(&row.user_id) {
            return Err(duplicate("user_roles_user_id_key"));
        }
        tables.user_roles.insert(row.user_id, row.role);
        Ok(())
    }

    async fn find_student_by_user(&self, caller: &Caller, user_id: UserId) -> Result<StudentRecord, StoreError> {
        let principal = self.principal(caller)?;
        let tables = self.read();
        let visible = match principal {
            Principal::Service => true,
            Principal::User(id) => id == user_id || tables.is_teacher(id),
        };
        if !visible {
            return Err(StoreError::NotFound);
        }
        tables
            .students
            .values()
            .find(|s| s.user_id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_students(&self, caller: &Caller) -> Result<Vec<StudentRecord>, StoreError> {
        let principal = self.principal(caller)?;
        let tables = self.read();
        if let Principal::User(id) = principal {
            if !tables.is_teacher(id) {
                return Err(permission_denied("students"));
            }
        }
        let mut rows: Vec<StudentRecord> = tables.students.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn insert_student(&self, caller: &Caller, row: &NewStudent) -> Result<StudentRecord, StoreError> {
        let principal = self.principal(caller)?;
        if !owns(principal, row.user_id) {
            return Err(rls_violation("students"));
        }
        let mut tables = self.write();
        if tables.students.values().any(|s| s.user_id == row.user_id) {
            return Err(duplicate("students_user_id_key"));
        }
        let record = StudentRecord {
            id: RecordId::new(),
            user_id: row.user_id,
            name: row.name.as_str().to_string(),
            subject: row.subject.clone(),
            marks: row.marks,
        };
        tables.students.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_student_marks(
        &self,
        caller: &Caller,
        id: RecordId,
        update: MarksUpdate,
    ) -> Result<StudentRecord, StoreError> {
        let principal = self.principal(caller)?;
        let mut tables = self.write();
        if let Principal::User(uid) = principal {
            if !tables.is_teacher(uid) {
                return Err(permission_denied("students"));
            }
        }
        let record = tables.students.get_mut(&id).ok_or(StoreError::NotFound)?;
        record.marks = update.marks;
        Ok(record.clone())
    }

    async fn find_teacher_by_user(&self, caller: &Caller, user_id: UserId) -> Result<TeacherRecord, StoreError> {
        let principal = self.principal(caller)?;
        if !owns(principal, user_id) {
            return Err(StoreError::NotFound);
        }
        self.read()
            .teachers
            .values()
            .find(|t| t.user_id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert_teacher(&self, caller: &Caller, row: &NewTeacher) -> Result<TeacherRecord, StoreError> {
        let principal = self.principal(caller)?;
        if !owns(principal, row.user_id) {
            return Err(rls_violation("teachers"));
        }
        let mut tables = self.write();
        if tables.teachers.values().any(|t| t.user_id == row.user_id) {
            return Err(duplicate("teachers_user_id_key"));
        }
        let record = TeacherRecord {
            id: RecordId::new(),
            user_id: row.user_id,
            name: row.name.as_str().to_string(),
        };
        tables.teachers.insert(record.id, record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use gradeportal_auth::{AccessToken, AuthUser};
    use gradeportal_records::{Marks, ProfileName};

    fn codec() -> Hs256TokenCodec {
        Hs256TokenCodec::new(b"store-test")
    }

    fn caller_for(codec: &Hs256TokenCodec, user_id: UserId) -> Caller {
        let user = AuthUser {
            id: user_id,
            email: format!("{user_id}@x.com"),
        };
        let (token, _) = codec.issue(&user, Utc::now(), Duration::minutes(5)).unwrap();
        Caller::User(token)
    }

    async fn student(store: &InMemoryPolicyStore, caller: &Caller, user_id: UserId, name: &str) -> StudentRecord {
        store
            .insert_user_role(caller, UserRoleRow { user_id, role: Role::Student })
            .await
            .unwrap();
        store
            .insert_student(caller, &NewStudent::for_user(user_id, ProfileName::new(name).unwrap()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn role_row_is_unique_per_user() {
        let store = InMemoryPolicyStore::new(codec());
        let uid = UserId::new();
        let caller = caller_for(&codec(), uid);

        store
            .insert_user_role(&caller, UserRoleRow { user_id: uid, role: Role::Student })
            .await
            .unwrap();
        let err = store
            .insert_user_role(&caller, UserRoleRow { user_id: uid, role: Role::Student })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn users_cannot_write_rows_for_others() {
        let store = InMemoryPolicyStore::new(codec());
        let caller = caller_for(&codec(), UserId::new());

        let err = store
            .insert_user_role(&caller, UserRoleRow { user_id: UserId::new(), role: Role::Teacher })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::PolicyRejected(_)));
    }

    #[tokio::test]
    async fn students_see_only_their_own_row() {
        let store = InMemoryPolicyStore::new(codec());
        let (a, b) = (UserId::new(), UserId::new());
        let ca = caller_for(&codec(), a);
        let cb = caller_for(&codec(), b);
        student(&store, &ca, a, "Alice").await;
        student(&store, &cb, b, "Bob").await;

        assert_eq!(store.find_student_by_user(&ca, a).await.unwrap().name, "Alice");
        assert_eq!(store.find_student_by_user(&ca, b).await.unwrap_err(), StoreError::NotFound);
        assert!(matches!(
            store.list_students(&ca).await.unwrap_err(),
            StoreError::PolicyRejected(_)
        ));
    }

    #[tokio::test]
    async fn teacher_lists_sorted_and_updates() {
        let store = InMemoryPolicyStore::new(codec());
        let (s1, s2, t) = (UserId::new(), UserId::new(), UserId::new());
        let c1 = caller_for(&codec(), s1);
        let c2 = caller_for(&codec(), s2);
        let ct = caller_for(&codec(), t);
        student(&store, &c1, s1, "Zoe").await;
        let adam = student(&store, &c2, s2, "Adam").await;
        store
            .insert_user_role(&ct, UserRoleRow { user_id: t, role: Role::Teacher })
            .await
            .unwrap();

        let names: Vec<String> = store.list_students(&ct).await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Adam", "Zoe"]);

        let updated = store
            .update_student_marks(&ct, adam.id, MarksUpdate { marks: Marks::new(88).unwrap() })
            .await
            .unwrap();
        assert_eq!(updated.marks.value(), 88);

        let err = store
            .update_student_marks(&c2, adam.id, MarksUpdate { marks: Marks::new(100).unwrap() })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::PolicyRejected(_)));
    }

    #[tokio::test]
    async fn foreign_or_garbage_tokens_are_unauthenticated() {
        let store = InMemoryPolicyStore::new(codec());
        let other = Hs256TokenCodec::new(b"someone-else");
        let caller = caller_for(&other, UserId::new());
        assert!(matches!(
            store.list_students(&caller).await.unwrap_err(),
            StoreError::Unauthenticated(_)
        ));

        let garbage = Caller::User(AccessToken::new("garbage"));
        assert!(matches!(
            store.find_user_role(&garbage, UserId::new()).await.unwrap_err(),
            StoreError::Unauthenticated(_)
        ));
        assert_eq!(store.requests(), 2);
    }

    #[tokio::test]
    async fn service_caller_bypasses_policies() {
        let store = InMemoryPolicyStore::new(codec());
        let uid = UserId::new();
        store
            .insert_user_role(&Caller::Service, UserRoleRow { user_id: uid, role: Role::Teacher })
            .await
            .unwrap();
        store
            .insert_teacher(&Caller::Service, &NewTeacher { user_id: uid, name: ProfileName::new("Mr T").unwrap() })
            .await
            .unwrap();
        assert_eq!(store.find_teacher_by_user(&Caller::Service, uid).await.unwrap().name, "Mr T");
        assert!(store.list_students(&Caller::Service).await.unwrap().is_empty());
    }
}
