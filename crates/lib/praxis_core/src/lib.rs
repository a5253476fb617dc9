//! # praxis_core
//!
//! Core domain logic for Praxis: PHI field encryption, authentication and
//! session management, and persistence for the practice domain.

pub mod appointments;
pub mod auth;
pub mod config;
pub mod encryption;
pub mod events;
pub mod finance;
pub mod migrate;
pub mod models;
pub mod notes;
pub mod patients;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
