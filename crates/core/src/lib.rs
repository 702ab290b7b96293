//! Bếp Core - shared types for the restaurant site.
//!
//! This crate is used by every other component:
//! - `server` - JSON API for the public site and the back office
//! - `client` - back-office client logic (auth guards, uploaders)
//! - `cli` - migrations, user management, scripted uploads
//!
//! # Architecture
//!
//! No I/O lives here: no database access, no HTTP. The cart engine and the
//! upload rules are pure so they can be unit-tested and shared between the
//! server's validation and the client's pre-flight checks.
//!
//! # Modules
//!
//! - [`types`] - IDs, money, contact details, roles and statuses
//! - [`user`] - the session user shape returned by the identity endpoints
//! - [`cart`] - in-memory cart store
//! - [`upload`] - upload restrictions, video rules and upload results
//! - [`i18n`] - locales and the user-facing messages the flows surface

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod i18n;
pub mod types;
pub mod upload;
pub mod user;

pub use cart::{Cart, CartItem, Customization};
pub use i18n::{Locale, Message};
pub use types::*;
pub use upload::{UploadRejection, UploadRestrictions, UploadResult, VideoRules};
pub use user::SessionUser;
