//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! bep-cli migrate
//! ```
//!
//! Migrations live in `crates/server/migrations/` and are embedded at
//! compile time. The server never runs them on start-up.

use secrecy::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply every pending migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run(database_url: &SecretString) -> Result<(), MigrationError> {
    let pool = super::connect(database_url).await?;

    tracing::info!("Running migrations...");
    let migrator = sqlx::migrate!("../server/migrations");
    migrator.run(&pool).await?;

    tracing::info!(count = migrator.iter().count(), "Migrations complete");
    Ok(())
}
