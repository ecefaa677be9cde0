// Common test utilities and helper structs
// Shared across all test files to avoid duplication

#![allow(dead_code)]

use diesel::prelude::*;
use funnel_data_core::db::{create_diesel_pool, DieselDatabaseConfig, DieselPool};
use once_cell::sync::Lazy;
use uuid::Uuid;

static TRACING: Lazy<()> = Lazy::new(|| {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
});

/// Helper struct for test queries that return a single integer
#[derive(QueryableByName)]
pub struct TestRow {
    #[diesel(sql_type = diesel::sql_types::Integer)]
    pub test: i32,
}

/// Helper struct for count queries
#[derive(QueryableByName)]
pub struct CountRow {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub count: i64,
}

/// Generate a unique email for test isolation
pub fn test_email(prefix: &str) -> String {
    format!("{}+{}@example.com", prefix, Uuid::new_v4().simple())
}

/// Generate a unique hostname for test isolation
pub fn test_hostname(prefix: &str) -> String {
    format!("{}-{}.example.com", prefix, Uuid::new_v4().simple())
}

/// Generate a unique slug for test isolation
pub fn test_slug(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// Create a pool for integration tests, or None when no database is
/// configured (e.g. in CI without PostgreSQL)
pub async fn try_test_pool() -> Option<DieselPool> {
    Lazy::force(&TRACING);
    dotenv::dotenv().ok();

    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("Skipping test: DATABASE_URL not set");
        return None;
    }

    let config = DieselDatabaseConfig::default();
    match create_diesel_pool(config).await {
        Ok(pool) => Some(pool),
        Err(e) => {
            eprintln!("Skipping test: Failed to create pool: {}", e);
            None
        },
    }
}
