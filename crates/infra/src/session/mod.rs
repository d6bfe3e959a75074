//! Adapters for the external session store (the hosted auth service).

pub mod in_memory;
pub mod rest;

pub use in_memory::InMemorySessionStore;
pub use rest::RestSessionStore;
