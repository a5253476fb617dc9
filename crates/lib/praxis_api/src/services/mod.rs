//! Service functions called by handlers. PHI is sealed and opened here.

pub mod appointments;
pub mod auth;
pub mod cookies;
pub mod finance;
pub mod notes;
pub mod patients;
