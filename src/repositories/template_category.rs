// Template category repository

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::RunQueryDsl;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::db::{self, DieselPool};
use crate::models::template_category::{
    CreateCategoryRequest, NewTemplateCategory, TemplateCategory, TemplateCategoryChanges,
    TemplateCategoryFilter,
};
use crate::schema::template_categories;
use crate::utils::data_error::{DataError, DataResult};

#[derive(Clone)]
pub struct TemplateCategoryRepository {
    pool: DieselPool,
}

impl TemplateCategoryRepository {
    pub fn new(pool: DieselPool) -> Self {
        Self { pool }
    }

    fn filtered(
        filter: &TemplateCategoryFilter,
    ) -> template_categories::BoxedQuery<'static, diesel::pg::Pg> {
        let mut query = template_categories::table.into_boxed();

        if let Some(is_active) = filter.is_active {
            query = query.filter(template_categories::is_active.eq(is_active));
        }
        if let Some(ref search) = filter.search {
            query = query.filter(template_categories::name.ilike(format!("%{}%", search)));
        }

        query
    }

    pub async fn find_by_id(&self, category_id: Uuid) -> DataResult<Option<TemplateCategory>> {
        let mut conn = self.pool.get().await?;

        template_categories::table
            .find(category_id)
            .first::<TemplateCategory>(&mut conn)
            .await
            .optional()
            .map_err(DataError::from)
    }

    pub async fn get_by_id(&self, category_id: Uuid) -> DataResult<TemplateCategory> {
        self.find_by_id(category_id)
            .await?
            .ok_or(DataError::NotFound)
    }

    pub async fn find_by_slug(&self, slug: &str) -> DataResult<Option<TemplateCategory>> {
        let mut conn = self.pool.get().await?;

        template_categories::table
            .filter(template_categories::slug.eq(slug))
            .first::<TemplateCategory>(&mut conn)
            .await
            .optional()
            .map_err(DataError::from)
    }

    pub async fn get_by_slug(&self, slug: &str) -> DataResult<TemplateCategory> {
        self.find_by_slug(slug).await?.ok_or(DataError::NotFound)
    }

    pub async fn find_first(
        &self,
        filter: &TemplateCategoryFilter,
    ) -> DataResult<Option<TemplateCategory>> {
        let mut conn = self.pool.get().await?;

        Self::filtered(filter)
            .order(template_categories::category_order.asc())
            .first::<TemplateCategory>(&mut conn)
            .await
            .optional()
            .map_err(DataError::from)
    }

    pub async fn get_first(&self, filter: &TemplateCategoryFilter) -> DataResult<TemplateCategory> {
        self.find_first(filter).await?.ok_or(DataError::NotFound)
    }

    /// Categories in display order
    pub async fn find_many(
        &self,
        filter: &TemplateCategoryFilter,
    ) -> DataResult<Vec<TemplateCategory>> {
        let mut conn = self.pool.get().await?;

        Self::filtered(filter)
            .order((
                template_categories::category_order.asc(),
                template_categories::name.asc(),
            ))
            .load::<TemplateCategory>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn count(&self, filter: &TemplateCategoryFilter) -> DataResult<i64> {
        let mut conn = self.pool.get().await?;

        Self::filtered(filter)
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// Create a category. Name and slug collisions surface as
    /// `DataError::Conflict`.
    #[instrument(skip(self, request))]
    pub async fn create(&self, mut request: CreateCategoryRequest) -> DataResult<TemplateCategory> {
        request.sanitize();
        request.validate()?;

        let mut conn = self.pool.get().await?;

        let category = diesel::insert_into(template_categories::table)
            .values(&NewTemplateCategory {
                name: request.name,
                slug: request.slug,
                description: request.description,
                icon: request.icon,
                category_order: request.category_order,
                is_active: true,
            })
            .get_result::<TemplateCategory>(&mut conn)
            .await?;

        info!("Created template category {} ({})", category.slug, category.id);
        Ok(category)
    }

    pub async fn create_many(
        &self,
        new_categories: Vec<NewTemplateCategory>,
    ) -> DataResult<usize> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(template_categories::table)
            .values(&new_categories)
            .execute(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn create_many_returning(
        &self,
        new_categories: Vec<NewTemplateCategory>,
    ) -> DataResult<Vec<TemplateCategory>> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(template_categories::table)
            .values(&new_categories)
            .get_results::<TemplateCategory>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn update(
        &self,
        category_id: Uuid,
        changes: TemplateCategoryChanges,
    ) -> DataResult<TemplateCategory> {
        let mut conn = self.pool.get().await?;

        diesel::update(template_categories::table.find(category_id))
            .set(&changes)
            .get_result::<TemplateCategory>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// The id collection and the update run in one transaction so the
    /// matched set cannot drift between the two statements.
    pub async fn update_many(
        &self,
        filter: &TemplateCategoryFilter,
        changes: TemplateCategoryChanges,
    ) -> DataResult<usize> {
        let filter = filter.clone();
        db::transaction(&self.pool, |conn| {
            async move {
                let ids: Vec<Uuid> = Self::filtered(&filter)
                    .select(template_categories::id)
                    .load::<Uuid>(conn)
                    .await?;
                if ids.is_empty() {
                    return Ok(0);
                }

                diesel::update(
                    template_categories::table.filter(template_categories::id.eq_any(ids)),
                )
                .set(&changes)
                .execute(conn)
                .await
                .map_err(DataError::from)
            }
            .scope_boxed()
        })
        .await
    }

    /// Insert, or update the existing row keyed by slug
    pub async fn upsert_by_slug(
        &self,
        new_category: NewTemplateCategory,
        changes: TemplateCategoryChanges,
    ) -> DataResult<TemplateCategory> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(template_categories::table)
            .values(&new_category)
            .on_conflict(template_categories::slug)
            .do_update()
            .set(&changes)
            .get_result::<TemplateCategory>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// Delete a category, returning the deleted record. Fails with
    /// `DataError::ForeignKeyViolation` while templates still reference it.
    pub async fn delete(&self, category_id: Uuid) -> DataResult<TemplateCategory> {
        let mut conn = self.pool.get().await?;

        diesel::delete(template_categories::table.find(category_id))
            .get_result::<TemplateCategory>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn delete_many(&self, filter: &TemplateCategoryFilter) -> DataResult<usize> {
        let filter = filter.clone();
        db::transaction(&self.pool, |conn| {
            async move {
                let ids: Vec<Uuid> = Self::filtered(&filter)
                    .select(template_categories::id)
                    .load::<Uuid>(conn)
                    .await?;
                if ids.is_empty() {
                    return Ok(0);
                }

                diesel::delete(
                    template_categories::table.filter(template_categories::id.eq_any(ids)),
                )
                .execute(conn)
                .await
                .map_err(DataError::from)
            }
            .scope_boxed()
        })
        .await
    }
}
