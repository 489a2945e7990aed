//! HTTP handlers.

pub mod health;
pub mod projects;
pub mod stages;
