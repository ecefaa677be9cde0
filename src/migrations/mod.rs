// Migration orchestrator for the funnel data layer
// Embedded in the application binary for distroless container compatibility

pub mod diesel;

use crate::db::DieselPool;
use std::error::Error;
use tracing::{error, info};

/// Configuration for migration execution
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub skip_diesel: bool,
    pub environment: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        let config = crate::app_config::config();

        Self {
            skip_diesel: false,
            environment: config.environment.to_string(),
        }
    }
}

/// Run all pending database migrations
pub async fn run_all_migrations(
    diesel_pool: &DieselPool,
    config: MigrationConfig,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!(
        "[MIGRATIONS] Starting migration process for environment: {}",
        config.environment
    );

    if config.skip_diesel {
        info!("[MIGRATIONS] Skipping Diesel migrations (disabled in config)");
        return Ok(());
    }

    info!("[MIGRATIONS] Running Diesel (PostgreSQL) migrations...");
    match diesel::run_migrations(diesel_pool).await {
        Ok(applied_count) => {
            if applied_count > 0 {
                info!("[MIGRATIONS] ✓ Applied {} Diesel migrations", applied_count);
            } else {
                info!("[MIGRATIONS] ✓ Diesel migrations up to date");
            }
        },
        Err(e) => {
            error!("[MIGRATIONS] ✗ Diesel migration failed: {}", e);
            return Err(format!("Diesel migration failed: {}", e).into());
        },
    }

    info!("[MIGRATIONS] ✓ Migration process completed successfully");
    Ok(())
}

/// Check if migrations should run based on environment variables
pub fn should_run_migrations() -> bool {
    let config = crate::app_config::config();

    !config.disable_embedded_migrations
}
