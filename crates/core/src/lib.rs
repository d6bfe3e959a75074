//! `gradeportal-core`: shared domain primitives.
//!
//! Identifiers, the domain error model and the small marker traits used by the
//! record types. Nothing here performs IO.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{RecordId, UserId};
pub use value_object::ValueObject;
