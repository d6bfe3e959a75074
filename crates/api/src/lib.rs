//! HTTP API: the account setup endpoints and their wiring.

pub mod app;
pub mod context;
pub mod middleware;
