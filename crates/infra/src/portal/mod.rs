//! Client-side portal flow.
//!
//! [`Portal`] is what a front end drives: it signs the user in or up, finishes
//! the auth callback, resolves the role and hands back dashboard data. Per user
//! it moves through
//!
//! ```text
//! Unauthenticated ──sign-in/sign-up──▶ NoRole ──role found / provisioned──▶ WithRole
//!        ▲                                                                    │
//!        └─────────────────────────────── sign-out ◀─────────────────────────┘
//! ```
//!
//! There is no transition that changes or revokes a role.

pub mod callback;
pub mod setup;
pub mod stash;

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use gradeportal_auth::{
    AuthGateway, AuthUser, OAuthProvider, OAuthRedirect, Role, Session, SessionError, SessionStore, SignInOutcome,
    SignUpOutcome,
};
use gradeportal_core::RecordId;
use gradeportal_records::{DashboardView, Profile, StudentRecord};

use crate::services::{DataAccess, DataAccessError, ProvisionError, Provisioner, RoleError, RoleResolver, SetupUserRequest};
use crate::store::{Caller, PolicyStore, StoreError};

pub use callback::CallbackRoute;
pub use setup::{HttpSetup, LocalSetup, ProfileSetup, SetupError};
pub use stash::{FileSignupStash, InMemorySignupStash, PendingSignup, SignupStash, StashError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalState {
    Unauthenticated,
    NoRole(AuthUser),
    WithRole(AuthUser, Role),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpFlow {
    /// Session issued and setup completed.
    Ready(Role),
    /// Waiting for the email link; setup resumes at the callback.
    AwaitingConfirmation { email: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardLoad {
    View(DashboardView),
    SelectRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeacherPanel {
    Students(Vec<StudentRecord>),
    RedirectToDashboard,
}

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Data(#[from] DataAccessError),

    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Stash(#[from] StashError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Portal {
    gateway: AuthGateway,
    store: Arc<dyn PolicyStore>,
    setup: Arc<dyn ProfileSetup>,
    stash: Arc<dyn SignupStash>,
    callback_url: String,
    state: Mutex<PortalState>,
}

impl Portal {
    /// `callback_url` is where the session store sends the browser after email
    /// confirmation or a third-party sign-in.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        store: Arc<dyn PolicyStore>,
        setup: Arc<dyn ProfileSetup>,
        stash: Arc<dyn SignupStash>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            gateway: AuthGateway::new(sessions),
            store,
            setup,
            stash,
            callback_url: callback_url.into(),
            state: Mutex::new(PortalState::Unauthenticated),
        }
    }

    pub fn state(&self) -> PortalState {
        self.lock_state().clone()
    }

    pub fn gateway(&self) -> &AuthGateway {
        &self.gateway
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome, PortalError> {
        let outcome = self.gateway.sign_in(email, password).await?;
        if let SignInOutcome::SignedIn(session) = &outcome {
            *self.lock_state() = PortalState::NoRole(session.user.clone());
        }
        Ok(outcome)
    }

    /// Register and, when a session comes back right away, complete setup.
    /// Otherwise the form is stashed for the callback.
    pub async fn sign_up(&self, form: &SignUpForm) -> Result<SignUpFlow, PortalError> {
        let outcome = self
            .gateway
            .sign_up(&form.email, &form.password, &self.callback_url)
            .await?;
        match outcome {
            SignUpOutcome::SessionEstablished(session) => {
                *self.lock_state() = PortalState::NoRole(session.user.clone());
                let pending = PendingSignup {
                    role: form.role,
                    name: form.name.clone(),
                    email: form.email.clone(),
                };
                self.run_setup(&session, &pending).await?;
                Ok(SignUpFlow::Ready(form.role))
            }
            SignUpOutcome::ConfirmationPending(user) => {
                self.stash.put(&PendingSignup {
                    role: form.role,
                    name: form.name.clone(),
                    email: user.email,
                })?;
                Ok(SignUpFlow::AwaitingConfirmation {
                    email: form.email.clone(),
                })
            }
        }
    }

    /// Start a third-party sign-in. `pending` carries the sign-up form when the
    /// user came from the registration page.
    pub async fn sign_in_with_oauth(
        &self,
        provider: &OAuthProvider,
        pending: Option<&PendingSignup>,
    ) -> Result<OAuthRedirect, PortalError> {
        if let Some(pending) = pending {
            self.stash.put(pending)?;
        }
        Ok(self.gateway.sign_in_with_oauth(provider, &self.callback_url).await?)
    }

    /// Decide where the callback page goes. `session` is what the redirect
    /// delivered, if anything.
    pub async fn complete_callback(&self, session: Option<Session>) -> CallbackRoute {
        if let Some(session) = session {
            *self.lock_state() = PortalState::NoRole(session.user.clone());
            self.gateway.adopt_session(session);
        }
        let Some(session) = self.gateway.current_session() else {
            return CallbackRoute::Login;
        };

        match self.resolve_role().await {
            Ok(Some(_)) => CallbackRoute::Dashboard,
            Ok(None) => match self.stash.take() {
                Ok(Some(pending)) => match self.run_setup(&session, &pending).await {
                    Ok(()) => CallbackRoute::Dashboard,
                    Err(e) => {
                        tracing::warn!(user_id = %session.user.id, error = %e, "deferred setup failed");
                        CallbackRoute::SelectRole
                    }
                },
                Ok(None) => CallbackRoute::SelectRole,
                Err(e) => {
                    tracing::warn!(error = %e, "stashed signup discarded");
                    CallbackRoute::SelectRole
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "auth callback failed");
                CallbackRoute::Login
            }
        }
    }

    /// Look up the signed-in user's role. `None` means no role yet.
    pub async fn resolve_role(&self) -> Result<Option<Role>, PortalError> {
        let session = self.session()?;
        let resolver = RoleResolver::new(self.store.clone());
        match resolver.get_role(&caller(&session), session.user.id).await {
            Ok(role) => {
                *self.lock_state() = PortalState::WithRole(session.user, role);
                Ok(Some(role))
            }
            Err(RoleError::NotSet) => {
                *self.lock_state() = PortalState::NoRole(session.user);
                Ok(None)
            }
            Err(RoleError::Store(e)) => Err(e.into()),
        }
    }

    /// The role-selection form: provision as the signed-in user.
    pub async fn select_role(&self, role: Role, name: &str) -> Result<Profile, PortalError> {
        let session = self.session()?;
        let profile = Provisioner::new(self.store.clone())
            .provision(&caller(&session), session.user.id, role, name, &session.user.email)
            .await?;
        *self.lock_state() = PortalState::WithRole(session.user, role);
        Ok(profile)
    }

    pub async fn load_dashboard(&self) -> Result<DashboardLoad, PortalError> {
        let session = self.session()?;
        let Some(role) = self.resolve_role().await? else {
            return Ok(DashboardLoad::SelectRole);
        };
        let data = DataAccess::new(self.store.clone());
        let caller = caller(&session);

        match role {
            Role::Student => match data.get_own_record(&caller, session.user.id).await {
                Ok(record) => Ok(DashboardLoad::View(DashboardView::for_student(&record))),
                Err(DataAccessError::ProfileMissing) => {
                    tracing::warn!(user_id = %session.user.id, "role without profile; sending to role selection");
                    Ok(DashboardLoad::SelectRole)
                }
                Err(e) => Err(e.into()),
            },
            Role::Teacher => {
                let records = data.get_all_records(&caller).await?;
                Ok(DashboardLoad::View(DashboardView::for_teacher(&records)))
            }
        }
    }

    pub async fn teacher_panel(&self) -> Result<TeacherPanel, PortalError> {
        let session = self.session()?;
        match self.resolve_role().await? {
            Some(Role::Teacher) => {
                let records = DataAccess::new(self.store.clone())
                    .get_all_records(&caller(&session))
                    .await?;
                Ok(TeacherPanel::Students(records))
            }
            _ => Ok(TeacherPanel::RedirectToDashboard),
        }
    }

    pub async fn update_marks(&self, record_id: RecordId, marks: i64) -> Result<StudentRecord, PortalError> {
        let session = self.session()?;
        Ok(DataAccess::new(self.store.clone())
            .update_marks(&caller(&session), record_id, marks)
            .await?)
    }

    pub async fn sign_out(&self) -> Result<(), PortalError> {
        *self.lock_state() = PortalState::Unauthenticated;
        self.gateway.sign_out().await?;
        Ok(())
    }

    async fn run_setup(&self, session: &Session, pending: &PendingSignup) -> Result<(), SetupError> {
        let request = SetupUserRequest {
            role: pending.role.as_str().to_string(),
            name: pending.name.clone(),
            email: pending.email.clone(),
        };
        self.setup.setup(&session.access_token, &request).await?;
        *self.lock_state() = PortalState::WithRole(session.user.clone(), pending.role);
        Ok(())
    }

    fn session(&self) -> Result<Session, PortalError> {
        self.gateway.current_session().ok_or(PortalError::NotSignedIn)
    }

    fn lock_state(&self) -> MutexGuard<'_, PortalState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn caller(session: &Session) -> Caller {
    Caller::User(session.access_token.clone())
}
