// Page repository - CRUD and sibling ordering within a funnel

use std::collections::HashSet;

use diesel::dsl::{count_star, max, min};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::RunQueryDsl;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::db::{self, DieselPool};
use crate::models::page::{
    CreatePageRequest, NewPage, Page, PageChanges, PageFilter, PageOrderAggregates,
};
use crate::schema::pages;
use crate::utils::data_error::{DataError, DataResult};

#[derive(Clone)]
pub struct PageRepository {
    pool: DieselPool,
}

impl PageRepository {
    pub fn new(pool: DieselPool) -> Self {
        Self { pool }
    }

    fn filtered(filter: &PageFilter) -> pages::BoxedQuery<'static, diesel::pg::Pg> {
        let mut query = pages::table.into_boxed();

        if let Some(funnel_id) = filter.funnel_id {
            query = query.filter(pages::funnel_id.eq(funnel_id));
        }
        if let Some(ref search) = filter.search {
            query = query.filter(pages::name.ilike(format!("%{}%", search)));
        }
        if let Some(has_linking_id) = filter.has_linking_id {
            query = if has_linking_id {
                query.filter(pages::linking_id.is_not_null())
            } else {
                query.filter(pages::linking_id.is_null())
            };
        }

        query
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    pub async fn find_by_id(&self, page_id: Uuid) -> DataResult<Option<Page>> {
        let mut conn = self.pool.get().await?;

        pages::table
            .find(page_id)
            .first::<Page>(&mut conn)
            .await
            .optional()
            .map_err(DataError::from)
    }

    pub async fn get_by_id(&self, page_id: Uuid) -> DataResult<Page> {
        self.find_by_id(page_id).await?.ok_or(DataError::NotFound)
    }

    pub async fn find_by_linking_id(&self, linking_id: &str) -> DataResult<Option<Page>> {
        let mut conn = self.pool.get().await?;

        pages::table
            .filter(pages::linking_id.eq(linking_id))
            .first::<Page>(&mut conn)
            .await
            .optional()
            .map_err(DataError::from)
    }

    pub async fn get_by_linking_id(&self, linking_id: &str) -> DataResult<Page> {
        self.find_by_linking_id(linking_id)
            .await?
            .ok_or(DataError::NotFound)
    }

    pub async fn find_first(&self, filter: &PageFilter) -> DataResult<Option<Page>> {
        let mut conn = self.pool.get().await?;

        Self::filtered(filter)
            .order(pages::page_order.asc())
            .first::<Page>(&mut conn)
            .await
            .optional()
            .map_err(DataError::from)
    }

    pub async fn get_first(&self, filter: &PageFilter) -> DataResult<Page> {
        self.find_first(filter).await?.ok_or(DataError::NotFound)
    }

    /// Pages matching the filter, in sibling order
    pub async fn find_many(&self, filter: &PageFilter) -> DataResult<Vec<Page>> {
        let mut conn = self.pool.get().await?;

        Self::filtered(filter)
            .order((pages::page_order.asc(), pages::created_at.asc()))
            .load::<Page>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn count(&self, filter: &PageFilter) -> DataResult<i64> {
        let mut conn = self.pool.get().await?;

        Self::filtered(filter)
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// Count and min/max sibling order for a funnel's pages
    pub async fn order_aggregates(&self, funnel_id: Uuid) -> DataResult<PageOrderAggregates> {
        let mut conn = self.pool.get().await?;

        let (count, min_order, max_order) = pages::table
            .filter(pages::funnel_id.eq(funnel_id))
            .select((count_star(), min(pages::page_order), max(pages::page_order)))
            .get_result::<(i64, Option<i32>, Option<i32>)>(&mut conn)
            .await?;

        Ok(PageOrderAggregates {
            count,
            min_order,
            max_order,
        })
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Create a page at the end of the funnel's sequence
    #[instrument(skip(self, request))]
    pub async fn create_in_funnel(
        &self,
        funnel_id: Uuid,
        mut request: CreatePageRequest,
    ) -> DataResult<Page> {
        request.sanitize();
        request.validate()?;

        let next_order = self
            .order_aggregates(funnel_id)
            .await?
            .max_order
            .map_or(0, |max_order| max_order + 1);

        let page = self
            .create(NewPage {
                name: request.name,
                content: request.content,
                page_order: next_order,
                linking_id: request.linking_id,
                funnel_id,
            })
            .await?;

        info!("Created page {} in funnel {}", page.id, funnel_id);
        Ok(page)
    }

    pub async fn create(&self, new_page: NewPage) -> DataResult<Page> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(pages::table)
            .values(&new_page)
            .get_result::<Page>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn create_many(&self, new_pages: Vec<NewPage>) -> DataResult<usize> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(pages::table)
            .values(&new_pages)
            .execute(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn create_many_returning(&self, new_pages: Vec<NewPage>) -> DataResult<Vec<Page>> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(pages::table)
            .values(&new_pages)
            .get_results::<Page>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn update(&self, page_id: Uuid, changes: PageChanges) -> DataResult<Page> {
        let mut conn = self.pool.get().await?;

        diesel::update(pages::table.find(page_id))
            .set(&changes)
            .get_result::<Page>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// The id collection and the update run in one transaction so the
    /// matched set cannot drift between the two statements.
    pub async fn update_many(&self, filter: &PageFilter, changes: PageChanges) -> DataResult<usize> {
        let filter = filter.clone();
        db::transaction(&self.pool, |conn| {
            async move {
                let ids: Vec<Uuid> = Self::filtered(&filter)
                    .select(pages::id)
                    .load::<Uuid>(conn)
                    .await?;
                if ids.is_empty() {
                    return Ok(0);
                }

                diesel::update(pages::table.filter(pages::id.eq_any(ids)))
                    .set(&changes)
                    .execute(conn)
                    .await
                    .map_err(DataError::from)
            }
            .scope_boxed()
        })
        .await
    }

    /// Insert, or update the existing row keyed by linking_id
    pub async fn upsert_by_linking_id(
        &self,
        new_page: NewPage,
        changes: PageChanges,
    ) -> DataResult<Page> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(pages::table)
            .values(&new_page)
            .on_conflict(pages::linking_id)
            .do_update()
            .set(&changes)
            .get_result::<Page>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// Delete a page, returning the deleted record
    pub async fn delete(&self, page_id: Uuid) -> DataResult<Page> {
        let mut conn = self.pool.get().await?;

        diesel::delete(pages::table.find(page_id))
            .get_result::<Page>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn delete_many(&self, filter: &PageFilter) -> DataResult<usize> {
        let filter = filter.clone();
        db::transaction(&self.pool, |conn| {
            async move {
                let ids: Vec<Uuid> = Self::filtered(&filter)
                    .select(pages::id)
                    .load::<Uuid>(conn)
                    .await?;
                if ids.is_empty() {
                    return Ok(0);
                }

                diesel::delete(pages::table.filter(pages::id.eq_any(ids)))
                    .execute(conn)
                    .await
                    .map_err(DataError::from)
            }
            .scope_boxed()
        })
        .await
    }

    /// Rewrite a funnel's page sequence in one transaction. `ordered_ids`
    /// must contain exactly the funnel's page ids in their new order.
    #[instrument(skip(self, ordered_ids))]
    pub async fn reorder(&self, funnel_id: Uuid, ordered_ids: Vec<Uuid>) -> DataResult<Vec<Page>> {
        let reordered = db::transaction(&self.pool, |conn| {
            async move {
                let existing: HashSet<Uuid> = pages::table
                    .filter(pages::funnel_id.eq(funnel_id))
                    .select(pages::id)
                    .load::<Uuid>(conn)
                    .await?
                    .into_iter()
                    .collect();

                // Set equality alone would admit duplicate ids, so the
                // length check has to run against the raw input list.
                let requested: HashSet<Uuid> = ordered_ids.iter().copied().collect();
                if ordered_ids.len() != existing.len() || requested != existing {
                    return Err(DataError::Validation(format!(
                        "Reorder must list each of the {} pages of funnel {} exactly once",
                        existing.len(),
                        funnel_id
                    )));
                }

                for (position, page_id) in ordered_ids.iter().enumerate() {
                    diesel::update(pages::table.find(*page_id))
                        .set(pages::page_order.eq(position as i32))
                        .execute(conn)
                        .await?;
                }

                pages::table
                    .filter(pages::funnel_id.eq(funnel_id))
                    .order(pages::page_order.asc())
                    .load::<Page>(conn)
                    .await
                    .map_err(DataError::from)
            }
            .scope_boxed()
        })
        .await?;

        info!(
            "Reordered {} pages in funnel {}",
            reordered.len(),
            funnel_id
        );
        Ok(reordered)
    }
}
