//! Embedded schema migrations.

use diesel::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{info, instrument};

use crate::db::DbError;

/// Migrations compiled from the crate's `migrations/` directory.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applies every pending migration to the given connection.
///
/// Returns the number of migrations applied.
///
/// # Errors
///
/// Returns [`DbError`] if any migration fails.
#[instrument(skip(conn))]
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<usize, DbError> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DbError::new(format!("Migration failed: {}", e)))?;
    info!(count = applied.len(), "Migrations applied");
    Ok(applied.len())
}
