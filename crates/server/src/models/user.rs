//! Back-office user domain type.

use chrono::{DateTime, Utc};

use bep_core::{Email, Permission, Role, SessionUser, UserId};

/// A back-office account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    /// Permissions stored on the row. Ignored for admins, who hold all.
    pub permissions: Vec<Permission>,
    pub full_name: Option<String>,
    pub email: Option<Email>,
    /// Inactive accounts cannot sign in.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The identity written to the session and returned to clients.
    #[must_use]
    pub fn to_session_user(&self) -> SessionUser {
        let permissions = match self.role {
            Role::Admin => Permission::ALL.to_vec(),
            Role::Staff => self.permissions.clone(),
        };
        SessionUser {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
            permissions,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: UserId::new(4),
            username: "thu".to_string(),
            role,
            permissions: vec![Permission::BookingsManage],
            full_name: Some("Nguyễn Thu".to_string()),
            email: None,
            active: true,
            created_at: DateTime::UNIX_EPOCH,
            updated_at: DateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_admin_session_lists_every_permission() {
        let session = user(Role::Admin).to_session_user();
        assert_eq!(session.permissions, Permission::ALL.to_vec());
    }

    #[test]
    fn test_staff_session_keeps_stored_permissions() {
        let session = user(Role::Staff).to_session_user();
        assert_eq!(session.permissions, vec![Permission::BookingsManage]);
        assert_eq!(session.display_name(), "Nguyễn Thu");
    }
}
