//! CLI subcommands.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Missing database configuration.
#[derive(Debug, thiserror::Error)]
#[error("Missing environment variable: ADMIN_DATABASE_URL (or DATABASE_URL)")]
pub struct MissingDatabaseUrl;

/// Read the admin database URL, falling back to `DATABASE_URL`.
fn database_url() -> Result<SecretString, MissingDatabaseUrl> {
    dotenvy::dotenv().ok();

    std::env::var("ADMIN_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MissingDatabaseUrl)
}
