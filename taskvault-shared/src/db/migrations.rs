/// Database migration runner
///
/// Migrations live in the `migrations/` directory of this crate and are
/// embedded at compile time via `sqlx::migrate!`. The API server runs them
/// once at startup, before accepting requests.

use sqlx::postgres::PgPool;
use tracing::info;

/// Runs all pending database migrations
///
/// Each migration runs in a transaction where Postgres allows it; a failed
/// migration is rolled back and the error returned.
///
/// # Example
///
/// ```no_run
/// use taskvault_shared::db::migrations::run_migrations;
/// # async fn example(pool: sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    sqlx::migrate!("./migrations").run(pool).await?;

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::{create_pool, DatabaseConfig};

    #[tokio::test]
    #[ignore] // Requires running Postgres instance
    async fn test_migrations_are_idempotent() {
        let config = DatabaseConfig {
            url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            ..Default::default()
        };
        let pool = create_pool(config).await.unwrap();

        run_migrations(&pool).await.expect("First run should succeed");
        run_migrations(&pool).await.expect("Second run should be a no-op");
    }
}
