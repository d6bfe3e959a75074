use gradeportal_auth::{AccessToken, AuthUser};

/// The caller behind a verified bearer token.
///
/// Extracting it is what authenticates a handler; see
/// [`crate::middleware`] for the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUser {
    user: AuthUser,
    token: AccessToken,
}

impl RequestUser {
    pub fn new(user: AuthUser, token: AccessToken) -> Self {
        Self { user, token }
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }
}
