//! Database migration commands.
//!
//! Migrations live in `crates/admin/migrations/` and are embedded at build
//! time.

use thiserror::Error;
use tracing::info;

use copper_kettle_admin::db;

use super::{MissingDatabaseUrl, database_url};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Config(#[from] MissingDatabaseUrl),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run admin database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails, or
/// a migration fails to apply.
pub async fn admin() -> Result<(), MigrationError> {
    let database_url = database_url()?;

    info!("Connecting to admin database...");
    let pool = db::create_pool(&database_url).await?;

    info!("Running admin migrations...");
    sqlx::migrate!("../admin/migrations").run(&pool).await?;

    info!("Admin migrations complete!");
    Ok(())
}
