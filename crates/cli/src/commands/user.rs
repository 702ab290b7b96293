//! Back-office account commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an owner account
//! BEP_NEW_PASSWORD=... bep-cli user create -u thu -r admin -n "Nguyễn Thu"
//!
//! # Create a staff account limited to bookings
//! BEP_NEW_PASSWORD=... bep-cli user create -u lan -p bookings.manage
//!
//! # List accounts
//! bep-cli user list
//! ```

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use bep_core::{Email, Permission, Role};
use bep_server::db::{RepositoryError, UserRepository};
use bep_server::services::auth::{AccountRequest, AuthError, AuthService};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid role: {0}. Valid roles: admin, staff")]
    InvalidRole(String),

    #[error("{0}")]
    InvalidPermission(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Repository(#[from] RepositoryError),
}

/// Arguments of `user create`.
#[derive(Debug)]
pub struct CreateArgs<'a> {
    pub username: &'a str,
    pub password: &'a SecretString,
    pub role: &'a str,
    pub permissions: &'a [String],
    pub full_name: Option<&'a str>,
    pub email: Option<&'a str>,
}

/// Parse `--permission` values; an empty list means the role's defaults.
fn parse_permissions(values: &[String]) -> Result<Option<Vec<Permission>>, UserError> {
    if values.is_empty() {
        return Ok(None);
    }
    values
        .iter()
        .map(|v| v.parse::<Permission>().map_err(UserError::InvalidPermission))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Create a back-office account.
///
/// # Errors
///
/// Returns an error for invalid input, a taken username, or a database failure.
pub async fn create(database_url: &SecretString, args: &CreateArgs<'_>) -> Result<(), UserError> {
    let role: Role = args
        .role
        .parse()
        .map_err(|_| UserError::InvalidRole(args.role.to_owned()))?;
    let permissions = parse_permissions(args.permissions)?;
    let email = args
        .email
        .map(Email::parse)
        .transpose()
        .map_err(|e| UserError::InvalidEmail(e.to_string()))?;

    let pool = super::connect(database_url).await?;
    let user = AuthService::new(&pool)
        .create_user(&AccountRequest {
            username: args.username,
            password: args.password.expose_secret(),
            role,
            permissions: permissions.as_deref(),
            full_name: args.full_name,
            email,
        })
        .await?;

    let granted = user.to_session_user().permissions;
    tracing::info!(
        id = %user.id,
        username = %user.username,
        role = %user.role,
        permissions = ?granted,
        "User created"
    );
    Ok(())
}

/// Log every account.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list(database_url: &SecretString) -> Result<(), UserError> {
    let pool = super::connect(database_url).await?;
    let users = UserRepository::new(&pool).list_all().await?;

    tracing::info!(count = users.len(), "Accounts");
    for user in users {
        tracing::info!(
            id = %user.id,
            username = %user.username,
            role = %user.role,
            active = user.active,
            "  {}",
            user.full_name.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_permissions() {
        assert_eq!(parse_permissions(&[]).unwrap(), None);
        assert_eq!(
            parse_permissions(&["menu.write".to_string(), "bookings.manage".to_string()]).unwrap(),
            Some(vec![Permission::MenuWrite, Permission::BookingsManage])
        );
        assert!(matches!(
            parse_permissions(&["menu.delete".to_string()]),
            Err(UserError::InvalidPermission(_))
        ));
    }
}
