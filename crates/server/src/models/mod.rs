//! Domain models for the site API.

pub mod booking;
pub mod menu;
pub mod seo;
pub mod session;
pub mod user;
pub mod video;

pub use booking::{Booking, BookingStatusUpdate, NewBooking, ValidBooking};
pub use menu::{MenuItem, MenuItemInput};
pub use seo::{PageSeo, PageSeoInput};
pub use session::keys as session_keys;
pub use user::User;
pub use video::{PublicVideo, SiteVideo};
