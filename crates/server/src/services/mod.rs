//! Business logic services.

pub mod auth;
pub mod media;
pub mod signing;
