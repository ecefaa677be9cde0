// Funnel repository - CRUD, domain attachments, template instantiation

use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::RunQueryDsl;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::{self, DieselPool};
use crate::models::domain::Domain;
use crate::models::funnel::{
    Funnel, FunnelChanges, FunnelFilter, FunnelOrder, FunnelSort, FunnelStatusCount, NewFunnel,
};
use crate::models::funnel_domain::{FunnelDomain, NewFunnelDomain};
use crate::models::page::{NewPage, Page};
use crate::models::pagination::{Paginated, Pagination, SortDirection};
use crate::models::template_page::TemplatePage;
use crate::schema::{domains, funnel_domains, funnels, pages, template_pages, templates};
use crate::utils::data_error::{DataError, DataResult};

#[derive(Clone)]
pub struct FunnelRepository {
    pool: DieselPool,
}

impl FunnelRepository {
    pub fn new(pool: DieselPool) -> Self {
        Self { pool }
    }

    fn filtered(filter: &FunnelFilter) -> funnels::BoxedQuery<'static, diesel::pg::Pg> {
        let mut query = funnels::table.into_boxed();

        if let Some(user_id) = filter.user_id {
            query = query.filter(funnels::user_id.eq(user_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(funnels::status.eq(status.as_str()));
        }
        if let Some(template_id) = filter.template_id {
            query = query.filter(funnels::template_id.eq(template_id));
        }
        if let Some(ref search) = filter.search {
            query = query.filter(funnels::name.ilike(format!("%{}%", search)));
        }
        if let Some(created_after) = filter.created_after {
            query = query.filter(funnels::created_at.ge(created_after));
        }
        if let Some(created_before) = filter.created_before {
            query = query.filter(funnels::created_at.le(created_before));
        }

        query
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    pub async fn find_by_id(&self, funnel_id: Uuid) -> DataResult<Option<Funnel>> {
        let mut conn = self.pool.get().await?;

        funnels::table
            .find(funnel_id)
            .first::<Funnel>(&mut conn)
            .await
            .optional()
            .map_err(DataError::from)
    }

    pub async fn get_by_id(&self, funnel_id: Uuid) -> DataResult<Funnel> {
        self.find_by_id(funnel_id).await?.ok_or(DataError::NotFound)
    }

    pub async fn find_first(&self, filter: &FunnelFilter) -> DataResult<Option<Funnel>> {
        let mut conn = self.pool.get().await?;

        Self::filtered(filter)
            .order(funnels::created_at.asc())
            .first::<Funnel>(&mut conn)
            .await
            .optional()
            .map_err(DataError::from)
    }

    pub async fn get_first(&self, filter: &FunnelFilter) -> DataResult<Funnel> {
        self.find_first(filter).await?.ok_or(DataError::NotFound)
    }

    pub async fn find_many(
        &self,
        filter: &FunnelFilter,
        pagination: &Pagination,
        order: FunnelOrder,
    ) -> DataResult<Paginated<Funnel>> {
        let mut conn = self.pool.get().await?;

        let total = Self::filtered(filter)
            .count()
            .get_result::<i64>(&mut conn)
            .await?;

        let query = Self::filtered(filter);
        let query = match (order.sort, order.direction) {
            (FunnelSort::Name, SortDirection::Asc) => query.order(funnels::name.asc()),
            (FunnelSort::Name, SortDirection::Desc) => query.order(funnels::name.desc()),
            (FunnelSort::CreatedAt, SortDirection::Asc) => query.order(funnels::created_at.asc()),
            (FunnelSort::CreatedAt, SortDirection::Desc) => query.order(funnels::created_at.desc()),
            (FunnelSort::UpdatedAt, SortDirection::Asc) => query.order(funnels::updated_at.asc()),
            (FunnelSort::UpdatedAt, SortDirection::Desc) => query.order(funnels::updated_at.desc()),
        };

        let items = query
            .limit(pagination.limit())
            .offset(pagination.offset())
            .load::<Funnel>(&mut conn)
            .await?;

        Ok(Paginated::new(items, total, pagination))
    }

    pub async fn count(&self, filter: &FunnelFilter) -> DataResult<i64> {
        let mut conn = self.pool.get().await?;

        Self::filtered(filter)
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// Funnel counts grouped by status, optionally scoped to one user
    pub async fn counts_by_status(
        &self,
        user_id: Option<Uuid>,
    ) -> DataResult<Vec<FunnelStatusCount>> {
        let mut conn = self.pool.get().await?;

        let rows = match user_id {
            Some(user_id) => {
                funnels::table
                    .filter(funnels::user_id.eq(user_id))
                    .group_by(funnels::status)
                    .select((funnels::status, count_star()))
                    .load::<FunnelStatusCount>(&mut conn)
                    .await?
            },
            None => {
                funnels::table
                    .group_by(funnels::status)
                    .select((funnels::status, count_star()))
                    .load::<FunnelStatusCount>(&mut conn)
                    .await?
            },
        };

        Ok(rows)
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    pub async fn create(&self, new_funnel: NewFunnel) -> DataResult<Funnel> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(funnels::table)
            .values(&new_funnel)
            .get_result::<Funnel>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn create_many(&self, new_funnels: Vec<NewFunnel>) -> DataResult<usize> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(funnels::table)
            .values(&new_funnels)
            .execute(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn create_many_returning(
        &self,
        new_funnels: Vec<NewFunnel>,
    ) -> DataResult<Vec<Funnel>> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(funnels::table)
            .values(&new_funnels)
            .get_results::<Funnel>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn update(&self, funnel_id: Uuid, changes: FunnelChanges) -> DataResult<Funnel> {
        let mut conn = self.pool.get().await?;

        diesel::update(funnels::table.find(funnel_id))
            .set(&changes)
            .get_result::<Funnel>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// The id collection and the update run in one transaction so the
    /// matched set cannot drift between the two statements.
    pub async fn update_many(
        &self,
        filter: &FunnelFilter,
        changes: FunnelChanges,
    ) -> DataResult<usize> {
        let filter = filter.clone();
        db::transaction(&self.pool, |conn| {
            async move {
                let ids: Vec<Uuid> = Self::filtered(&filter)
                    .select(funnels::id)
                    .load::<Uuid>(conn)
                    .await?;
                if ids.is_empty() {
                    return Ok(0);
                }

                diesel::update(funnels::table.filter(funnels::id.eq_any(ids)))
                    .set(&changes)
                    .execute(conn)
                    .await
                    .map_err(DataError::from)
            }
            .scope_boxed()
        })
        .await
    }

    /// Insert with a caller-supplied id, or update the existing row
    pub async fn upsert(
        &self,
        funnel_id: Uuid,
        new_funnel: NewFunnel,
        changes: FunnelChanges,
    ) -> DataResult<Funnel> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(funnels::table)
            .values((
                funnels::id.eq(funnel_id),
                funnels::name.eq(&new_funnel.name),
                funnels::status.eq(&new_funnel.status),
                funnels::user_id.eq(new_funnel.user_id),
                funnels::template_id.eq(new_funnel.template_id),
            ))
            .on_conflict(funnels::id)
            .do_update()
            .set(&changes)
            .get_result::<Funnel>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// Delete a funnel, returning the deleted record.
    /// Pages and domain attachments go with it (FK cascade).
    pub async fn delete(&self, funnel_id: Uuid) -> DataResult<Funnel> {
        let mut conn = self.pool.get().await?;

        diesel::delete(funnels::table.find(funnel_id))
            .get_result::<Funnel>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn delete_many(&self, filter: &FunnelFilter) -> DataResult<usize> {
        let filter = filter.clone();
        db::transaction(&self.pool, |conn| {
            async move {
                let ids: Vec<Uuid> = Self::filtered(&filter)
                    .select(funnels::id)
                    .load::<Uuid>(conn)
                    .await?;
                if ids.is_empty() {
                    return Ok(0);
                }

                diesel::delete(funnels::table.filter(funnels::id.eq_any(ids)))
                    .execute(conn)
                    .await
                    .map_err(DataError::from)
            }
            .scope_boxed()
        })
        .await
    }

    // =========================================================================
    // DOMAIN ATTACHMENTS
    // =========================================================================

    /// Attach a domain to a funnel. A duplicate pairing is rejected by the
    /// compound unique index and surfaces as `DataError::Conflict`.
    #[instrument(skip(self))]
    pub async fn attach_domain(&self, funnel_id: Uuid, domain_id: Uuid) -> DataResult<FunnelDomain> {
        let mut conn = self.pool.get().await?;

        let attachment = diesel::insert_into(funnel_domains::table)
            .values(&NewFunnelDomain::active(funnel_id, domain_id))
            .get_result::<FunnelDomain>(&mut conn)
            .await?;

        info!("Attached domain {} to funnel {}", domain_id, funnel_id);
        Ok(attachment)
    }

    /// Detach a domain, returning the removed attachment
    pub async fn detach_domain(&self, funnel_id: Uuid, domain_id: Uuid) -> DataResult<FunnelDomain> {
        let mut conn = self.pool.get().await?;

        diesel::delete(
            funnel_domains::table
                .filter(funnel_domains::funnel_id.eq(funnel_id))
                .filter(funnel_domains::domain_id.eq(domain_id)),
        )
        .get_result::<FunnelDomain>(&mut conn)
        .await
        .map_err(DataError::from)
    }

    /// Toggle an attachment without removing it
    pub async fn set_domain_active(
        &self,
        funnel_id: Uuid,
        domain_id: Uuid,
        is_active: bool,
    ) -> DataResult<FunnelDomain> {
        let mut conn = self.pool.get().await?;

        diesel::update(
            funnel_domains::table
                .filter(funnel_domains::funnel_id.eq(funnel_id))
                .filter(funnel_domains::domain_id.eq(domain_id)),
        )
        .set(funnel_domains::is_active.eq(is_active))
        .get_result::<FunnelDomain>(&mut conn)
        .await
        .map_err(DataError::from)
    }

    /// Domains actively attached to a funnel
    pub async fn active_domains(&self, funnel_id: Uuid) -> DataResult<Vec<Domain>> {
        let mut conn = self.pool.get().await?;

        funnel_domains::table
            .inner_join(domains::table)
            .filter(funnel_domains::funnel_id.eq(funnel_id))
            .filter(funnel_domains::is_active.eq(true))
            .select(Domain::as_select())
            .load::<Domain>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    // =========================================================================
    // TEMPLATE INSTANTIATION
    // =========================================================================

    /// Create a funnel from a template: copy the template's page blueprints
    /// into real pages and bump the template usage counter, all in one
    /// transaction.
    #[instrument(skip(self, name))]
    pub async fn instantiate_from_template(
        &self,
        user_id: Uuid,
        name: String,
        template_id: Uuid,
    ) -> DataResult<(Funnel, Vec<Page>)> {
        let (funnel, created_pages) = db::transaction(&self.pool, |conn| {
            async move {
                templates::table
                    .find(template_id)
                    .select(templates::id)
                    .first::<Uuid>(conn)
                    .await
                    .optional()?
                    .ok_or(DataError::NotFound)?;

                let blueprints = template_pages::table
                    .filter(template_pages::template_id.eq(template_id))
                    .order(template_pages::page_order.asc())
                    .load::<TemplatePage>(conn)
                    .await?;
                if blueprints.is_empty() {
                    // A template without pages is not instantiable
                    return Err(DataError::Validation(format!(
                        "Template {} has no pages",
                        template_id
                    )));
                }

                diesel::update(templates::table.find(template_id))
                    .set((
                        templates::usage_count.eq(templates::usage_count + 1),
                        templates::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)
                    .await?;

                let funnel = diesel::insert_into(funnels::table)
                    .values(&NewFunnel {
                        name,
                        status: crate::models::funnel::FunnelStatus::Draft.as_str().to_string(),
                        user_id,
                        template_id: Some(template_id),
                    })
                    .get_result::<Funnel>(conn)
                    .await?;

                let new_pages: Vec<NewPage> = blueprints
                    .iter()
                    .map(|blueprint| NewPage {
                        name: blueprint.name.clone(),
                        content: blueprint.content.clone(),
                        page_order: blueprint.page_order,
                        linking_id: blueprint.instantiated_linking_id(funnel.id),
                        funnel_id: funnel.id,
                    })
                    .collect();

                let created_pages = diesel::insert_into(pages::table)
                    .values(&new_pages)
                    .get_results::<Page>(conn)
                    .await?;

                Ok((funnel, created_pages))
            }
            .scope_boxed()
        })
        .await?;

        info!(
            "Instantiated funnel {} from template {} with {} pages",
            funnel.id,
            template_id,
            created_pages.len()
        );
        Ok((funnel, created_pages))
    }
}
