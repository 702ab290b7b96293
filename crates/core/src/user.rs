//! The signed-in back-office user as seen by both server and client.

use serde::{Deserialize, Serialize};

use crate::types::{Email, Permission, Role, UserId};

/// User payload returned by login and by the identity endpoints, and
/// persisted by the client under the `user` storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
}

impl SessionUser {
    /// Whether this user holds `permission`. Admins hold all of them.
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role == Role::Admin || self.permissions.contains(&permission)
    }

    /// Name to greet the user with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn staff() -> SessionUser {
        SessionUser {
            id: UserId::new(3),
            username: "lan".to_string(),
            role: Role::Staff,
            permissions: vec![Permission::BookingsManage],
            full_name: None,
            email: None,
        }
    }

    #[test]
    fn test_admin_has_every_permission() {
        let admin = SessionUser {
            role: Role::Admin,
            permissions: Vec::new(),
            ..staff()
        };
        assert!(Permission::ALL.iter().all(|p| admin.has_permission(*p)));
    }

    #[test]
    fn test_staff_permissions_are_explicit() {
        let user = staff();
        assert!(user.has_permission(Permission::BookingsManage));
        assert!(!user.has_permission(Permission::ContentWrite));
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let mut user = staff();
        user.full_name = Some("Nguyễn Thị Lan".to_string());
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["fullName"], "Nguyễn Thị Lan");
        assert_eq!(json["role"], "staff");
        assert!(json.get("email").is_none());
        assert_eq!(user.display_name(), "Nguyễn Thị Lan");
    }
}
