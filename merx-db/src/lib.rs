//! Database lifecycle management for the Merx services.
//!
//! Provides pool construction, migration running, and status checking.
//! Each service embeds its own migrations with `sqlx::migrate!` and passes
//! the migrator in; the two services share no database.

use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::{info, warn};

/// Result type for DB operations.
pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Connect a pool to the given database.
pub async fn connect(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    info!("Connected to database");
    Ok(pool)
}

/// Run all pending migrations.
///
/// Idempotent: safe to run multiple times.
pub async fn run_migrations(pool: &PgPool, migrator: &Migrator) -> Result<()> {
    info!("Running database migrations...");

    migrator.run(pool).await?;

    info!("Migrations completed successfully");
    Ok(())
}

/// Check database connectivity and migration status.
///
/// Logs the latest applied migrations.
pub async fn status(pool: &PgPool) -> Result<()> {
    let result: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;

    if result != 1 {
        return Err(anyhow::anyhow!("Database connectivity check failed"));
    }

    info!("Database connectivity: OK");

    let rows = sqlx::query(
        r#"
        SELECT version, description, success
        FROM _sqlx_migrations
        ORDER BY version DESC
        LIMIT 10
        "#,
    )
    .fetch_all(pool)
    .await;

    match rows {
        Ok(migs) if !migs.is_empty() => {
            info!("Latest migrations:");
            for mig in migs {
                let version: i64 = mig.get("version");
                let description: String = mig.get("description");
                let success: bool = mig.get("success");

                let status = if success { "ok" } else { "FAILED" };
                info!("  [{}] v{}: {}", status, version, description);
            }
        },
        Ok(_) => {
            warn!("No migrations found in database (run migrations first)");
        },
        Err(e) => {
            // Table might not exist yet
            if e.to_string().contains("_sqlx_migrations") {
                warn!("Migration table not found (run migrations first)");
            } else {
                return Err(e.into());
            }
        },
    }

    Ok(())
}
