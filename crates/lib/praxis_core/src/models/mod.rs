//! Domain models shared by persistence and the HTTP layer.

pub mod auth;
pub mod clinic;
