// Shared data context - the composition root that wires config, the
// connection pool, embedded migrations and the per-entity repositories

use std::sync::Arc;

use tracing::info;

use crate::app_config::{self, AppConfig};
use crate::db::{self, DieselPool};
use crate::migrations;
use crate::repositories::{
    DomainRepository, FunnelRepository, PageRepository, TemplateCategoryRepository,
    TemplateRepository, UserRepository,
};
use crate::utils::data_error::{DataError, DataResult};

/// Shared data-access context handed out to consumers of this crate
#[derive(Clone)]
pub struct DataContext {
    pub config: Arc<AppConfig>,
    pub pool: DieselPool,
    pub users: UserRepository,
    pub funnels: FunnelRepository,
    pub domains: DomainRepository,
    pub pages: PageRepository,
    pub templates: TemplateRepository,
    pub template_categories: TemplateCategoryRepository,
}

impl DataContext {
    /// Build a context from an existing pool, without touching the
    /// environment or running migrations
    pub fn from_pool(config: Arc<AppConfig>, pool: DieselPool) -> Self {
        Self {
            config,
            users: UserRepository::new(pool.clone()),
            funnels: FunnelRepository::new(pool.clone()),
            domains: DomainRepository::new(pool.clone()),
            pages: PageRepository::new(pool.clone()),
            templates: TemplateRepository::new(pool.clone()),
            template_categories: TemplateCategoryRepository::new(pool.clone()),
            pool,
        }
    }

    /// Verify database connectivity
    pub async fn health_check(&self) -> DataResult<()> {
        db::check_diesel_health(&self.pool)
            .await
            .map_err(|e| DataError::Pool(e.to_string()))
    }
}

/// Initialize the full data layer for external consumers
pub async fn initialize_data_context() -> Result<DataContext, Box<dyn std::error::Error>> {
    // Load environment
    dotenv::dotenv().ok();

    let config = app_config::config();

    info!("Initializing database pool...");
    let db_config = db::DieselDatabaseConfig::default();
    let pool = db::create_diesel_pool(db_config).await?;

    if migrations::should_run_migrations() {
        info!("Running embedded migrations...");
        let migration_config = migrations::MigrationConfig::default();
        migrations::run_all_migrations(&pool, migration_config)
            .await
            .map_err(|e| format!("Migration failed: {}", e))?;
    }

    Ok(DataContext::from_pool(Arc::new(config.clone()), pool))
}
