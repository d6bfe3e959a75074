//! Infrastructure layer: configuration, remote store adapters, application
//! services and the client-side portal flow.

pub mod config;
pub mod portal;
pub mod services;
pub mod session;
pub mod store;

#[cfg(test)]
mod test_support;
