//! `gradeportal-auth`: authentication boundary.
//!
//! The session store itself is an external service; this crate holds the contract
//! it must satisfy ([`SessionStore`]), the gateway the rest of the portal talks to
//! ([`AuthGateway`]), and the token/claims types shared by adapters.
//!
//! Nothing here speaks HTTP. Adapters live in `gradeportal-infra`.

pub mod claims;
pub mod gateway;
pub mod jwt;
pub mod principal;
pub mod provider;
pub mod roles;
pub mod session;

pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use gateway::{AuthGateway, ResendConfirmation, SignInOutcome, SignUpOutcome};
pub use jwt::Hs256TokenCodec;
pub use principal::{AccessToken, AuthUser, Session};
pub use provider::OAuthProvider;
pub use roles::Role;
pub use session::{OAuthRedirect, SessionError, SessionStore, SignUpResult};
