//! Application services over the policy store.
//!
//! Services hold no state of their own beyond the store handle; every call is
//! one or two store round-trips on behalf of a [`Caller`](crate::store::Caller).

pub mod account;
pub mod data_access;
pub mod provisioner;
pub mod role_resolver;

pub use account::{AccountError, AccountService, SetupUserRequest};
pub use data_access::{DataAccess, DataAccessError};
pub use provisioner::{ProvisionError, Provisioner};
pub use role_resolver::{RoleError, RoleResolver};
