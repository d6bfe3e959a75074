use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Third-party identity provider name as the session store knows it
/// (e.g. `"google"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OAuthProvider(Cow<'static, str>);

impl OAuthProvider {
    pub const GOOGLE: OAuthProvider = OAuthProvider(Cow::Borrowed("google"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
