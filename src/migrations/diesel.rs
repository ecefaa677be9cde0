// Diesel migration runner for PostgreSQL
// Uses embedded migrations from diesel_migrations crate
// Note: diesel_migrations requires sync connections, not async

use crate::db::{diesel_pool::MIGRATIONS, DieselPool};
use diesel::Connection;
use diesel::PgConnection;
use diesel_migrations::MigrationHarness;
use std::error::Error;
use tracing::{debug, info};

/// Run all pending Diesel migrations
/// Returns the number of migrations applied
pub async fn run_migrations(_pool: &DieselPool) -> Result<usize, Box<dyn Error + Send + Sync>> {
    info!("[DIESEL] Starting Diesel migration process...");

    // Migrations need a sync connection
    let database_url = crate::app_config::config().database_url.clone();

    // Run migrations in a blocking task since MigrationHarness is sync
    let applied_migrations =
        tokio::task::spawn_blocking(move || -> Result<usize, Box<dyn Error + Send + Sync>> {
            debug!("[DIESEL] Establishing sync connection for migrations...");

            let mut conn = PgConnection::establish(&database_url)
                .map_err(|e| format!("Failed to establish sync connection: {}", e))?;

            debug!("[DIESEL] Checking for pending migrations...");

            let pending_migrations = conn
                .pending_migrations(MIGRATIONS)
                .map_err(|e| format!("Failed to check pending migrations: {}", e))?;

            let pending_count = pending_migrations.len();

            if pending_count == 0 {
                debug!("[DIESEL] No pending migrations found");
                return Ok(0);
            }

            info!("[DIESEL] Found {} pending migrations", pending_count);

            let applied = conn
                .run_pending_migrations(MIGRATIONS)
                .map_err(|e| format!("Failed to run migrations: {}", e))?;

            let applied_count = applied.len();
            info!("[DIESEL] Successfully applied {} migrations", applied_count);

            for migration in applied {
                debug!("[DIESEL] Applied migration: {}", migration);
            }

            Ok(applied_count)
        })
        .await
        .map_err(|e| format!("Migration task panicked: {}", e))??;

    info!("[DIESEL] Diesel migration process completed successfully");
    Ok(applied_migrations)
}
