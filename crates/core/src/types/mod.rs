//! Core types for the restaurant site.
//!
//! Type-safe wrappers for the domain concepts shared across crates.

pub mod contact;
pub mod id;
pub mod price;
pub mod role;

pub use contact::{ContactError, Email, PhoneNumber};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use role::*;
