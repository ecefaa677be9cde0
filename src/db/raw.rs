// Raw SQL passthrough and transaction batching.
// Escape hatches for queries the typed layer does not cover.

use diesel::deserialize::QueryableByName;
use diesel::pg::Pg;
use diesel_async::scoped_futures::ScopedBoxFuture;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::instrument;

use super::diesel_pool::DieselPool;
use crate::utils::data_error::{DataError, DataResult};

/// Execute a raw SQL statement, returning the number of affected rows.
///
/// The statement is passed to PostgreSQL verbatim; callers are responsible
/// for parameterization and must never interpolate untrusted input.
#[instrument(skip(pool, sql))]
pub async fn execute_raw(pool: &DieselPool, sql: &str) -> DataResult<usize> {
    let mut conn = pool.get().await?;

    diesel::sql_query(sql)
        .execute(&mut conn)
        .await
        .map_err(DataError::from)
}

/// Run a raw SQL query, deserializing rows into `T` by column name.
///
/// `T` must derive `QueryableByName` with explicit `sql_type` annotations.
#[instrument(skip(pool, sql))]
pub async fn query_raw<T>(pool: &DieselPool, sql: &str) -> DataResult<Vec<T>>
where
    T: QueryableByName<Pg> + Send + 'static,
{
    let mut conn = pool.get().await?;

    diesel::sql_query(sql)
        .load::<T>(&mut conn)
        .await
        .map_err(DataError::from)
}

/// Run a batch of operations inside a single database transaction.
///
/// The closure receives the transaction's connection; any `Err` return
/// rolls the whole batch back. Use `.scope_boxed()` on the async block:
///
/// ```ignore
/// use diesel_async::scoped_futures::ScopedFutureExt;
///
/// let created = db::transaction(&pool, |conn| {
///     async move {
///         // multiple statements, all-or-nothing
///         Ok(funnel)
///     }
///     .scope_boxed()
/// })
/// .await?;
/// ```
pub async fn transaction<'a, R, F>(pool: &DieselPool, callback: F) -> DataResult<R>
where
    F: for<'r> FnOnce(&'r mut AsyncPgConnection) -> ScopedBoxFuture<'a, 'r, DataResult<R>>
        + Send
        + 'a,
    R: Send + 'a,
{
    let mut conn = pool.get().await?;
    let conn: &mut AsyncPgConnection = &mut conn;
    conn.transaction(callback).await
}
