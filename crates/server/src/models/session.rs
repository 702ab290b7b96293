//! Session-stored identity.
//!
//! The session holds the [`SessionUser`](bep_core::SessionUser) written at
//! login; the identity endpoints return it as-is.

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the signed-in user.
    pub const CURRENT_USER: &str = "current_user";
}
