//! Bếp back-office client.
//!
//! The logic that sits between a back-office user interface and the site
//! API: credentialed requests, session-expiry handling, route guards, and
//! the two upload pipelines. The user interface itself is reached through
//! the ports in [`ports`] (toasts, navigation, persisted storage), so the
//! same code drives a desktop shell, the CLI, or a test harness.
//!
//! # Wiring
//!
//! [`BackOffice`] builds an [`ApiClient`] around a [`LogoutDispatcher`] and
//! subscribes a [`SessionExpiryHandler`] to it. Every request that comes
//! back 401 goes through the dispatcher instead of surfacing as an error.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod back_office;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod expiry;
pub mod guard;
pub mod http;
pub mod ports;
pub mod session;
pub mod upload;

pub use back_office::{BackOffice, Ports};
pub use config::ClientConfig;
pub use dispatch::{LogoutDispatcher, LogoutHandler, SubscriptionId};
pub use error::ApiError;
pub use expiry::SessionExpiryHandler;
pub use guard::{AuthGuard, GuardState, GuardView, IdentitySource};
pub use http::{ApiClient, OnUnauthorized};
pub use ports::{Navigator, Notifier, ToastLevel, TracingNavigator, TracingNotifier};
pub use session::{FileStorage, MemoryStorage, SessionIdentity, SessionStorage};
pub use upload::{
    BatchResult, FileInput, FileUpload, ObjectUploader, StagedVideo, UploadDashboard, VideoPhase,
    VideoUploadError, VideoUploader,
};
