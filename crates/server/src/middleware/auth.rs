//! Authentication extractors for the back-office API.
//!
//! The session holds the signed-in [`SessionUser`]. Missing sessions are
//! answered with 401, a role outside the area with 403. Both are JSON so
//! the client's logout dispatcher can react to the 401.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use bep_core::{Area, Permission, SessionUser};

use crate::error::AppError;
use crate::models::session_keys;

/// Rejection for the area extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    Unauthorized,
    Forbidden(Area),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => AppError::Unauthorized("Not signed in".to_string()),
            Self::Forbidden(area) => {
                AppError::Forbidden(format!("No access to the {} area", area.as_str()))
            }
        }
        .into_response()
    }
}

async fn current_user(parts: &Parts) -> Option<SessionUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<SessionUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

async fn require_area(parts: &Parts, area: Area) -> Result<SessionUser, AuthRejection> {
    let user = current_user(parts).await.ok_or(AuthRejection::Unauthorized)?;
    if user.role.can_enter(area) {
        Ok(user)
    } else {
        Err(AuthRejection::Forbidden(area))
    }
}

/// Extractor for routes under the admin area.
///
/// ```rust,ignore
/// async fn handler(AdminUser(user): AdminUser) -> impl IntoResponse {
///     Json(user)
/// }
/// ```
pub struct AdminUser(pub SessionUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_area(parts, Area::Admin).await.map(Self)
    }
}

/// Extractor for routes under the staff area. Admins are let in too.
pub struct StaffUser(pub SessionUser);

impl<S> FromRequestParts<S> for StaffUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_area(parts, Area::Staff).await.map(Self)
    }
}

/// Extractor that optionally gets the signed-in user.
pub struct OptionalUser(pub Option<SessionUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

/// Fail with 403 unless `user` holds `permission`.
///
/// # Errors
///
/// Returns `AppError::Forbidden` naming the missing permission.
pub fn require_permission(user: &SessionUser, permission: Permission) -> Result<(), AppError> {
    if user.has_permission(permission) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("Missing permission {permission}")))
    }
}

/// Store the signed-in user in the session, rotating its ID first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &SessionUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Drop the whole session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be removed from the store.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use bep_core::{Role, UserId};

    fn staff() -> SessionUser {
        SessionUser {
            id: UserId::new(2),
            username: "lan".to_string(),
            role: Role::Staff,
            permissions: vec![Permission::BookingsManage],
            full_name: None,
            email: None,
        }
    }

    #[test]
    fn test_require_permission() {
        let user = staff();
        assert!(require_permission(&user, Permission::BookingsManage).is_ok());
        let err = require_permission(&user, Permission::UsersManage).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(m) if m.contains("users.manage")));
    }

    #[test]
    fn test_rejection_status() {
        assert_eq!(
            AuthRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthRejection::Forbidden(Area::Admin).into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
