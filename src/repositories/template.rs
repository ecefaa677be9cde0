// Template repository - templates plus their preview images and
// page blueprints, usage aggregates and per-category counts

use chrono::Utc;
use diesel::dsl::{count_star, max, min, sum};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::RunQueryDsl;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::db::{self, DieselPool};
use crate::models::pagination::{Paginated, Pagination, SortDirection};
use crate::models::template::{
    CreateTemplateRequest, NewTemplate, Template, TemplateCategoryCount, TemplateChanges,
    TemplateFilter, TemplateSort, TemplateUsageAggregates,
};
use crate::models::template_image::{
    CreateTemplateImageRequest, NewTemplateImage, TemplateImage, TemplateImageChanges,
};
use crate::models::template_page::{NewTemplatePage, TemplatePage, TemplatePageChanges};
use crate::schema::{template_images, template_pages, templates};
use crate::utils::data_error::{DataError, DataResult};

#[derive(Clone)]
pub struct TemplateRepository {
    pool: DieselPool,
}

impl TemplateRepository {
    pub fn new(pool: DieselPool) -> Self {
        Self { pool }
    }

    fn filtered(filter: &TemplateFilter) -> templates::BoxedQuery<'static, diesel::pg::Pg> {
        let mut query = templates::table.into_boxed();

        if let Some(category_id) = filter.category_id {
            query = query.filter(templates::category_id.eq(category_id));
        }
        if let Some(created_by_user_id) = filter.created_by_user_id {
            query = query.filter(templates::created_by_user_id.eq(created_by_user_id));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(templates::is_active.eq(is_active));
        }
        if let Some(is_public) = filter.is_public {
            query = query.filter(templates::is_public.eq(is_public));
        }
        if let Some(ref search) = filter.search {
            let pattern = format!("%{}%", search);
            query = query.filter(
                templates::name
                    .ilike(pattern.clone())
                    .or(templates::description.ilike(pattern)),
            );
        }
        if let Some(ref tag) = filter.tag {
            query = query.filter(templates::tags.contains(vec![Some(tag.clone())]));
        }

        query
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    pub async fn find_by_id(&self, template_id: Uuid) -> DataResult<Option<Template>> {
        let mut conn = self.pool.get().await?;

        templates::table
            .find(template_id)
            .first::<Template>(&mut conn)
            .await
            .optional()
            .map_err(DataError::from)
    }

    pub async fn get_by_id(&self, template_id: Uuid) -> DataResult<Template> {
        self.find_by_id(template_id)
            .await?
            .ok_or(DataError::NotFound)
    }

    pub async fn find_by_slug(&self, slug: &str) -> DataResult<Option<Template>> {
        let mut conn = self.pool.get().await?;

        templates::table
            .filter(templates::slug.eq(slug))
            .first::<Template>(&mut conn)
            .await
            .optional()
            .map_err(DataError::from)
    }

    pub async fn get_by_slug(&self, slug: &str) -> DataResult<Template> {
        self.find_by_slug(slug).await?.ok_or(DataError::NotFound)
    }

    pub async fn find_first(&self, filter: &TemplateFilter) -> DataResult<Option<Template>> {
        let mut conn = self.pool.get().await?;

        Self::filtered(filter)
            .order(templates::created_at.asc())
            .first::<Template>(&mut conn)
            .await
            .optional()
            .map_err(DataError::from)
    }

    pub async fn get_first(&self, filter: &TemplateFilter) -> DataResult<Template> {
        self.find_first(filter).await?.ok_or(DataError::NotFound)
    }

    pub async fn find_many(
        &self,
        filter: &TemplateFilter,
        pagination: &Pagination,
        sort: TemplateSort,
        direction: SortDirection,
    ) -> DataResult<Paginated<Template>> {
        let mut conn = self.pool.get().await?;

        let total = Self::filtered(filter)
            .count()
            .get_result::<i64>(&mut conn)
            .await?;

        let query = Self::filtered(filter);
        let query = match (sort, direction) {
            (TemplateSort::Name, SortDirection::Asc) => query.order(templates::name.asc()),
            (TemplateSort::Name, SortDirection::Desc) => query.order(templates::name.desc()),
            (TemplateSort::UsageCount, SortDirection::Asc) => {
                query.order(templates::usage_count.asc())
            },
            (TemplateSort::UsageCount, SortDirection::Desc) => {
                query.order(templates::usage_count.desc())
            },
            (TemplateSort::CreatedAt, SortDirection::Asc) => {
                query.order(templates::created_at.asc())
            },
            (TemplateSort::CreatedAt, SortDirection::Desc) => {
                query.order(templates::created_at.desc())
            },
        };

        let items = query
            .limit(pagination.limit())
            .offset(pagination.offset())
            .load::<Template>(&mut conn)
            .await?;

        Ok(Paginated::new(items, total, pagination))
    }

    pub async fn count(&self, filter: &TemplateFilter) -> DataResult<i64> {
        let mut conn = self.pool.get().await?;

        Self::filtered(filter)
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// Count / sum / min / max / avg over usage counters for templates
    /// matching the filter
    pub async fn usage_aggregates(
        &self,
        filter: &TemplateFilter,
    ) -> DataResult<TemplateUsageAggregates> {
        let mut conn = self.pool.get().await?;

        let (count, total_usage, min_usage, max_usage) = Self::filtered(filter)
            .select((
                count_star(),
                sum(templates::usage_count),
                min(templates::usage_count),
                max(templates::usage_count),
            ))
            .get_result::<(i64, Option<i64>, Option<i32>, Option<i32>)>(&mut conn)
            .await?;

        let avg_usage = match (total_usage, count) {
            (Some(total), count) if count > 0 => Some(total as f64 / count as f64),
            _ => None,
        };

        Ok(TemplateUsageAggregates {
            count,
            total_usage,
            min_usage,
            max_usage,
            avg_usage,
        })
    }

    /// Template counts grouped by category
    pub async fn counts_by_category(&self) -> DataResult<Vec<TemplateCategoryCount>> {
        let mut conn = self.pool.get().await?;

        templates::table
            .group_by(templates::category_id)
            .select((templates::category_id, count_star()))
            .load::<TemplateCategoryCount>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Publish a template. Slug collisions surface as `DataError::Conflict`.
    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        mut request: CreateTemplateRequest,
        created_by_user_id: Uuid,
    ) -> DataResult<Template> {
        request.sanitize();
        request.validate()?;
        request
            .validate_custom()
            .map_err(DataError::Validation)?;

        let tags: Vec<Option<String>> = request.tags.into_iter().map(Some).collect();

        let template = self
            .create_record(NewTemplate {
                name: request.name,
                slug: request.slug,
                description: request.description,
                category_id: request.category_id,
                tags,
                is_active: true,
                is_public: request.is_public,
                created_by_user_id,
                metadata: request.metadata,
            })
            .await?;

        info!("Created template {} ({})", template.slug, template.id);
        Ok(template)
    }

    pub async fn create_record(&self, new_template: NewTemplate) -> DataResult<Template> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(templates::table)
            .values(&new_template)
            .get_result::<Template>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn create_many(&self, new_templates: Vec<NewTemplate>) -> DataResult<usize> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(templates::table)
            .values(&new_templates)
            .execute(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn create_many_returning(
        &self,
        new_templates: Vec<NewTemplate>,
    ) -> DataResult<Vec<Template>> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(templates::table)
            .values(&new_templates)
            .get_results::<Template>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn update(&self, template_id: Uuid, changes: TemplateChanges) -> DataResult<Template> {
        let mut conn = self.pool.get().await?;

        diesel::update(templates::table.find(template_id))
            .set(&changes)
            .get_result::<Template>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// The id collection and the update run in one transaction so the
    /// matched set cannot drift between the two statements.
    pub async fn update_many(
        &self,
        filter: &TemplateFilter,
        changes: TemplateChanges,
    ) -> DataResult<usize> {
        let filter = filter.clone();
        db::transaction(&self.pool, |conn| {
            async move {
                let ids: Vec<Uuid> = Self::filtered(&filter)
                    .select(templates::id)
                    .load::<Uuid>(conn)
                    .await?;
                if ids.is_empty() {
                    return Ok(0);
                }

                diesel::update(templates::table.filter(templates::id.eq_any(ids)))
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
        new_template: NewTemplate,
        changes: TemplateChanges,
    ) -> DataResult<Template> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(templates::table)
            .values(&new_template)
            .on_conflict(templates::slug)
            .do_update()
            .set(&changes)
            .get_result::<Template>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// Atomically bump the usage counter (used outside the funnel
    /// instantiation transaction, e.g. for manual imports)
    pub async fn record_usage(&self, template_id: Uuid) -> DataResult<Template> {
        let mut conn = self.pool.get().await?;

        diesel::update(templates::table.find(template_id))
            .set((
                templates::usage_count.eq(templates::usage_count + 1),
                templates::updated_at.eq(Utc::now()),
            ))
            .get_result::<Template>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// Delete a template, returning the deleted record. Images and page
    /// blueprints cascade; funnels keep their nullable reference intact
    /// only if the caller clears it first.
    pub async fn delete(&self, template_id: Uuid) -> DataResult<Template> {
        let mut conn = self.pool.get().await?;

        diesel::delete(templates::table.find(template_id))
            .get_result::<Template>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn delete_many(&self, filter: &TemplateFilter) -> DataResult<usize> {
        let filter = filter.clone();
        db::transaction(&self.pool, |conn| {
            async move {
                let ids: Vec<Uuid> = Self::filtered(&filter)
                    .select(templates::id)
                    .load::<Uuid>(conn)
                    .await?;
                if ids.is_empty() {
                    return Ok(0);
                }

                diesel::delete(templates::table.filter(templates::id.eq_any(ids)))
                    .execute(conn)
                    .await
                    .map_err(DataError::from)
            }
            .scope_boxed()
        })
        .await
    }

    // =========================================================================
    // PREVIEW IMAGES
    // =========================================================================

    #[instrument(skip(self, request))]
    pub async fn add_image(
        &self,
        template_id: Uuid,
        request: CreateTemplateImageRequest,
    ) -> DataResult<TemplateImage> {
        request.validate()?;

        let mut conn = self.pool.get().await?;

        diesel::insert_into(template_images::table)
            .values(&NewTemplateImage {
                template_id,
                image_url: request.image_url,
                image_type: request.image_type,
                image_order: request.image_order,
                caption: request.caption,
            })
            .get_result::<TemplateImage>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// A template's images in display order
    pub async fn images(&self, template_id: Uuid) -> DataResult<Vec<TemplateImage>> {
        let mut conn = self.pool.get().await?;

        template_images::table
            .filter(template_images::template_id.eq(template_id))
            .order(template_images::image_order.asc())
            .load::<TemplateImage>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn get_image(&self, image_id: Uuid) -> DataResult<TemplateImage> {
        let mut conn = self.pool.get().await?;

        template_images::table
            .find(image_id)
            .first::<TemplateImage>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// An all-None changeset returns the stored record unchanged; the
    /// table has no updated_at column to fall back on.
    pub async fn update_image(
        &self,
        image_id: Uuid,
        changes: TemplateImageChanges,
    ) -> DataResult<TemplateImage> {
        if changes.is_empty() {
            return self.get_image(image_id).await;
        }

        let mut conn = self.pool.get().await?;

        diesel::update(template_images::table.find(image_id))
            .set(&changes)
            .get_result::<TemplateImage>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn delete_image(&self, image_id: Uuid) -> DataResult<TemplateImage> {
        let mut conn = self.pool.get().await?;

        diesel::delete(template_images::table.find(image_id))
            .get_result::<TemplateImage>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    // =========================================================================
    // PAGE BLUEPRINTS
    // =========================================================================

    pub async fn add_page(&self, new_page: NewTemplatePage) -> DataResult<TemplatePage> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(template_pages::table)
            .values(&new_page)
            .get_result::<TemplatePage>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn add_pages_returning(
        &self,
        new_pages: Vec<NewTemplatePage>,
    ) -> DataResult<Vec<TemplatePage>> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(template_pages::table)
            .values(&new_pages)
            .get_results::<TemplatePage>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// A template's page blueprints in sibling order
    pub async fn template_pages(&self, template_id: Uuid) -> DataResult<Vec<TemplatePage>> {
        let mut conn = self.pool.get().await?;

        template_pages::table
            .filter(template_pages::template_id.eq(template_id))
            .order(template_pages::page_order.asc())
            .load::<TemplatePage>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn update_page(
        &self,
        page_id: Uuid,
        changes: TemplatePageChanges,
    ) -> DataResult<TemplatePage> {
        let mut conn = self.pool.get().await?;

        diesel::update(template_pages::table.find(page_id))
            .set(&changes)
            .get_result::<TemplatePage>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn delete_page(&self, page_id: Uuid) -> DataResult<TemplatePage> {
        let mut conn = self.pool.get().await?;

        diesel::delete(template_pages::table.find(page_id))
            .get_result::<TemplatePage>(&mut conn)
            .await
            .map_err(DataError::from)
    }
}
