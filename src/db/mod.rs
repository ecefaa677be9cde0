pub mod diesel_pool;
pub mod raw;

pub use diesel_pool::{
    check_diesel_health, create_diesel_pool, mask_connection_string, DieselDatabaseConfig,
    DieselPool, MIGRATIONS,
};
pub use raw::{execute_raw, query_raw, transaction};
