/// Database migration runner
///
/// Migrations live in `migrations/` at the workspace root and are embedded
/// into the binary at compile time. Each one is a reversible pair:
/// `{timestamp}_{name}.up.sql` and `{timestamp}_{name}.down.sql`.

use sqlx::{
    migrate::{MigrateDatabase, MigrationType},
    postgres::PgPool,
    Postgres,
};
use tracing::{debug, info, warn};

/// Applies all pending migrations
///
/// Each migration runs in its own transaction; a failing one is rolled back
/// and reported.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    match sqlx::migrate!("../migrations").run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}

/// Number of migrations embedded in this build
///
/// Down scripts are not counted.
pub fn embedded_migration_count() -> usize {
    sqlx::migrate!("../migrations")
        .iter()
        .filter(|m| !matches!(m.migration_type, MigrationType::ReversibleDown))
        .count()
}

/// Creates the database named in `database_url` if it doesn't exist yet
///
/// Development and test convenience; production databases are provisioned
/// separately.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if Postgres::database_exists(database_url).await? {
        debug!("Database already exists");
        return Ok(());
    }

    info!("Database does not exist, creating it");
    Postgres::create_database(database_url).await?;
    info!("Database created successfully");

    Ok(())
}
