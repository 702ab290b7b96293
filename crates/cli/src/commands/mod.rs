//! Subcommand implementations.

pub mod media;
pub mod menu;
pub mod migrate;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;

/// Connect using the pool settings the server uses.
///
/// # Errors
///
/// Returns `sqlx::Error` if the database is unreachable.
pub async fn connect(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Connecting to database...");
    bep_server::db::create_pool(database_url).await
}
