//! Roles, permissions and the status enums stored in the database.

use serde::{Deserialize, Serialize};

/// Back-office role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "site.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Owners and managers. Holds every permission.
    Admin,
    /// Front-of-house and kitchen staff. Holds the permissions granted on
    /// their user row.
    Staff,
}

impl Role {
    /// Whether a user with this role may enter the given back-office area.
    ///
    /// Admins may use the staff area; staff may not use the admin area.
    #[must_use]
    pub const fn can_enter(self, area: Area) -> bool {
        matches!(
            (self, area),
            (Self::Admin, _) | (Self::Staff, Area::Staff)
        )
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Staff => write!(f, "staff"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Back-office area protected by an auth guard.
///
/// The area name is also the path segment of its identity endpoint
/// (`/api/{area}/me`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Area {
    Admin,
    Staff,
}

impl Area {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
        }
    }
}

/// Fine-grained back-office permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "menu.write")]
    MenuWrite,
    #[serde(rename = "content.write")]
    ContentWrite,
    #[serde(rename = "media.upload")]
    MediaUpload,
    #[serde(rename = "bookings.manage")]
    BookingsManage,
    #[serde(rename = "users.manage")]
    UsersManage,
}

impl Permission {
    pub const ALL: [Self; 5] = [
        Self::MenuWrite,
        Self::ContentWrite,
        Self::MediaUpload,
        Self::BookingsManage,
        Self::UsersManage,
    ];

    /// Permissions granted to new staff accounts.
    pub const STAFF_DEFAULTS: [Self; 3] = [Self::BookingsManage, Self::MenuWrite, Self::MediaUpload];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MenuWrite => "menu.write",
            Self::ContentWrite => "content.write",
            Self::MediaUpload => "media.upload",
            Self::BookingsManage => "bookings.manage",
            Self::UsersManage => "users.manage",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("invalid permission: {s}"))
    }
}

/// Table booking lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "site.booking_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

/// Page slot a background video can be staged for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "site.video_slot", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum VideoSlot {
    /// Home page hero banner.
    Hero,
    /// Background of the reservation section.
    Reservation,
}

impl VideoSlot {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Reservation => "reservation",
        }
    }
}

impl std::str::FromStr for VideoSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hero" => Ok(Self::Hero),
            "reservation" => Ok(Self::Reservation),
            _ => Err(format!("invalid video slot: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_area_access() {
        assert!(Role::Admin.can_enter(Area::Admin));
        assert!(Role::Admin.can_enter(Area::Staff));
        assert!(Role::Staff.can_enter(Area::Staff));
        assert!(!Role::Staff.can_enter(Area::Admin));
    }

    #[test]
    fn test_permission_round_trips_through_str() {
        for permission in Permission::ALL {
            assert_eq!(permission.as_str().parse::<Permission>(), Ok(permission));
        }
        assert!("menu.delete".parse::<Permission>().is_err());
    }

    #[test]
    fn test_permission_serializes_dotted() {
        let json = serde_json::to_string(&Permission::BookingsManage).unwrap();
        assert_eq!(json, "\"bookings.manage\"");
    }
}
