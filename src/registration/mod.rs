//! Team registration model and status rules.

pub mod models;

pub use models::{RegistrationStatus, TeamRegistration};
