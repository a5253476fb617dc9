//! Request handlers.

pub mod appointments;
pub mod auth;
pub mod finance;
pub mod health;
pub mod notes;
pub mod patients;
