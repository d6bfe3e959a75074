//! REST adapter for the hosted database (PostgREST dialect).
//!
//! User calls send the anon key as `apikey` and the user's token as bearer, so
//! the database evaluates row policies for that user. Service calls send the
//! service key in both places.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use gradeportal_core::{RecordId, UserId};
use gradeportal_records::{MarksUpdate, NewStudent, NewTeacher, StudentRecord, TeacherRecord, UserRoleRow};

use super::{Caller, PolicyStore, StoreError};
use crate::config::PortalConfig;

/// Accept header asking for exactly one row; zero rows yields `PGRST116`.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

const USER_ROLES: &str = "user_roles";
const STUDENTS: &str = "students";
const TEACHERS: &str = "teachers";

pub struct RestPolicyStore {
    client: Client,
    rest_url: String,
    anon_key: String,
    service_key: String,
}

impl RestPolicyStore {
    pub fn new(store_url: &str, anon_key: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            rest_url: format!("{}/rest/v1", store_url.trim_end_matches('/')),
            anon_key: anon_key.into(),
            service_key: service_key.into(),
        }
    }

    pub fn from_config(config: &PortalConfig) -> Self {
        Self::new(&config.store_url, config.anon_key.clone(), config.service_key.clone())
    }

    fn request(&self, method: Method, table: &str, caller: &Caller) -> RequestBuilder {
        let (apikey, bearer) = match caller {
            Caller::Service => (self.service_key.as_str(), self.service_key.as_str()),
            Caller::User(token) => (self.anon_key.as_str(), token.as_str()),
        };
        self.client
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", apikey)
            .bearer_auth(bearer)
    }

    fn select_one(&self, table: &str, caller: &Caller, column: &str, value: &str) -> RequestBuilder {
        self.request(Method::GET, table, caller)
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT)
            .query(&[("select", "*".to_string()), (column, format!("eq.{value}"))])
    }

    fn insert_returning(&self, table: &str, caller: &Caller) -> RequestBuilder {
        self.request(Method::POST, table, caller)
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT)
            .header("Prefer", "return=representation")
    }
}

#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, StoreError> {
    let response = request
        .send()
        .await
        .map_err(|e| StoreError::Transport(e.to_string()))?;
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }
    response
        .json::<T>()
        .await
        .map_err(|e| StoreError::Decode(e.to_string()))
}

async fn execute(request: RequestBuilder) -> Result<(), StoreError> {
    let response = request
        .send()
        .await
        .map_err(|e| StoreError::Transport(e.to_string()))?;
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }
    Ok(())
}

async fn error_from_response(response: Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let parsed: PostgrestError = serde_json::from_str(&body).unwrap_or_default();
    let message = parsed.message.unwrap_or(body);
    classify(status, parsed.code, message)
}

fn classify(status: u16, code: Option<String>, message: String) -> StoreError {
    match code.as_deref() {
        Some("PGRST116") => StoreError::NotFound,
        Some("23505") => StoreError::Conflict(message),
        Some("42501") => StoreError::PolicyRejected(message),
        Some("PGRST301") | Some("PGRST302") => StoreError::Unauthenticated(message),
        _ => match status {
            401 => StoreError::Unauthenticated(message),
            403 => StoreError::PolicyRejected(message),
            _ => StoreError::Rejected { status, code, message },
        },
    }
}

#[async_trait]
impl PolicyStore for RestPolicyStore {
    async fn find_user_role(&self, caller: &Caller, user_id: UserId) -> Result<UserRoleRow, StoreError> {
        tracing::debug!(%user_id, "select user_roles");
        fetch(self.select_one(USER_ROLES, caller, "user_id", &user_id.to_string())).await
    }

    async fn insert_user_role(&self, caller: &Caller, row: UserRoleRow) -> Result<(), StoreError> {
        tracing::debug!(user_id = %row.user_id, role = %row.role, "insert user_roles");
        execute(
            self.request(Method::POST, USER_ROLES, caller)
                .header("Prefer", "return=minimal")
                .json(&row),
        )
        .await
    }

    async fn find_student_by_user(&self, caller: &Caller, user_id: UserId) -> Result<StudentRecord, StoreError> {
        tracing::debug!(%user_id, "select students by user");
        fetch(self.select_one(STUDENTS, caller, "user_id", &user_id.to_string())).await
    }

    async fn list_students(&self, caller: &Caller) -> Result<Vec<StudentRecord>, StoreError> {
        tracing::debug!("select all students");
        fetch(
            self.request(Method::GET, STUDENTS, caller)
                .query(&[("select", "*"), ("order", "name.asc")]),
        )
        .await
    }

    async fn insert_student(&self, caller: &Caller, row: &NewStudent) -> Result<StudentRecord, StoreError> {
        tracing::debug!(user_id = %row.user_id, "insert students");
        fetch(self.insert_returning(STUDENTS, caller).json(row)).await
    }

    async fn update_student_marks(
        &self,
        caller: &Caller,
        id: RecordId,
        update: MarksUpdate,
    ) -> Result<StudentRecord, StoreError> {
        tracing::debug!(record_id = %id, marks = %update.marks, "update students.marks");
        fetch(
            self.request(Method::PATCH, STUDENTS, caller)
                .header(reqwest::header::ACCEPT, SINGLE_OBJECT)
                .header("Prefer", "return=representation")
                .query(&[("id", format!("eq.{id}"))])
                .json(&update),
        )
        .await
    }

    async fn find_teacher_by_user(&self, caller: &Caller, user_id: UserId) -> Result<TeacherRecord, StoreError> {
        tracing::debug!(%user_id, "select teachers by user");
        fetch(self.select_one(TEACHERS, caller, "user_id", &user_id.to_string())).await
    }

    async fn insert_teacher(&self, caller: &Caller, row: &NewTeacher) -> Result<TeacherRecord, StoreError> {
        tracing::debug!(user_id = %row.user_id, "insert teachers");
        fetch(self.insert_returning(TEACHERS, caller).json(row)).await
    }
}
