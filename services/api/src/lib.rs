//! TechSupport API Library Crate
//!
//! This library contains the HTTP surface of the support agent: configuration,
//! shared state, the in-memory session store, API handlers and routing. The
//! `api` binary is a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod sessions;
pub mod state;
