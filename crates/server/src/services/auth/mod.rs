//! Authentication service.
//!
//! Username and password sign-in for back-office accounts.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use bep_core::{Email, Permission, Role};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, UserRepository};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 32;

/// Fields accepted when creating an account.
#[derive(Debug, Clone)]
pub struct AccountRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub role: Role,
    /// Ignored for admins. `None` gives staff the default set.
    pub permissions: Option<&'a [Permission]>,
    pub full_name: Option<&'a str>,
    pub email: Option<Email>,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Check a username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown user, an
    /// inactive account, or a wrong password.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let (user, password_hash) = self
            .users
            .get_password_hash(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if let Err(e) = self.users.record_login(user.id).await {
            tracing::warn!(error = %e, user_id = %user.id, "Failed to record login time");
        }

        Ok(user)
    }

    /// Create a back-office account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` or `AuthError::WeakPassword` for
    /// bad input, and `AuthError::UserAlreadyExists` if the username is taken.
    pub async fn create_user(&self, request: &AccountRequest<'_>) -> Result<User, AuthError> {
        let username = request.username.trim();
        validate_username(username)?;
        validate_password(request.password)?;

        let password_hash = hash_password(request.password)?;
        let permissions = match request.role {
            Role::Admin => &[][..],
            Role::Staff => request.permissions.unwrap_or(&Permission::STAFF_DEFAULTS),
        };

        self.users
            .create(&NewUser {
                username,
                password_hash: &password_hash,
                role: request.role,
                permissions,
                full_name: request.full_name,
                email: request.email.as_ref(),
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }
}

/// Validate username format: 3-32 characters of `a-z`, `0-9`, `.`, `_`, `-`.
fn validate_username(username: &str) -> Result<(), AuthError> {
    let len = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) {
        return Err(AuthError::InvalidUsername(format!(
            "Username must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
    {
        return Err(AuthError::InvalidUsername(
            "Username may only contain lowercase letters, digits, '.', '_' and '-'".to_string(),
        ));
    }
    Ok(())
}

/// Validate password meets minimum requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
