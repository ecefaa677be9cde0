// Domain repository - CRUD plus DNS / SSL lifecycle transitions

use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::RunQueryDsl;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::db::{self, DieselPool};
use crate::models::domain::{
    CreateDomainRequest, Domain, DomainChanges, DomainFilter, DomainStatus, DomainStatusCount,
    NewDomain, SslStatus,
};
use crate::models::pagination::{Paginated, Pagination};
use crate::schema::domains;
use crate::utils::data_error::{DataError, DataResult};

#[derive(Clone)]
pub struct DomainRepository {
    pool: DieselPool,
}

impl DomainRepository {
    pub fn new(pool: DieselPool) -> Self {
        Self { pool }
    }

    fn filtered(filter: &DomainFilter) -> domains::BoxedQuery<'static, diesel::pg::Pg> {
        let mut query = domains::table.into_boxed();

        if let Some(user_id) = filter.user_id {
            query = query.filter(domains::user_id.eq(user_id));
        }
        if let Some(domain_type) = filter.domain_type {
            query = query.filter(domains::domain_type.eq(domain_type.as_str()));
        }
        if let Some(status) = filter.status {
            query = query.filter(domains::status.eq(status.as_str()));
        }
        if let Some(ssl_status) = filter.ssl_status {
            query = query.filter(domains::ssl_status.eq(ssl_status.as_str()));
        }
        if let Some(ref needle) = filter.hostname_contains {
            query = query.filter(domains::hostname.ilike(format!("%{}%", needle)));
        }

        query
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    pub async fn find_by_id(&self, domain_id: Uuid) -> DataResult<Option<Domain>> {
        let mut conn = self.pool.get().await?;

        domains::table
            .find(domain_id)
            .first::<Domain>(&mut conn)
            .await
            .optional()
            .map_err(DataError::from)
    }

    pub async fn get_by_id(&self, domain_id: Uuid) -> DataResult<Domain> {
        self.find_by_id(domain_id).await?.ok_or(DataError::NotFound)
    }

    /// Hostname lookup is the redirect hot path; hostnames are stored
    /// lowercase so this is a plain unique-index hit.
    pub async fn find_by_hostname(&self, hostname: &str) -> DataResult<Option<Domain>> {
        let mut conn = self.pool.get().await?;

        domains::table
            .filter(domains::hostname.eq(hostname.to_lowercase()))
            .first::<Domain>(&mut conn)
            .await
            .optional()
            .map_err(DataError::from)
    }

    pub async fn get_by_hostname(&self, hostname: &str) -> DataResult<Domain> {
        self.find_by_hostname(hostname)
            .await?
            .ok_or(DataError::NotFound)
    }

    pub async fn find_first(&self, filter: &DomainFilter) -> DataResult<Option<Domain>> {
        let mut conn = self.pool.get().await?;

        Self::filtered(filter)
            .order(domains::created_at.asc())
            .first::<Domain>(&mut conn)
            .await
            .optional()
            .map_err(DataError::from)
    }

    pub async fn get_first(&self, filter: &DomainFilter) -> DataResult<Domain> {
        self.find_first(filter).await?.ok_or(DataError::NotFound)
    }

    pub async fn find_many(
        &self,
        filter: &DomainFilter,
        pagination: &Pagination,
    ) -> DataResult<Paginated<Domain>> {
        let mut conn = self.pool.get().await?;

        let total = Self::filtered(filter)
            .count()
            .get_result::<i64>(&mut conn)
            .await?;

        let items = Self::filtered(filter)
            .order(domains::created_at.desc())
            .limit(pagination.limit())
            .offset(pagination.offset())
            .load::<Domain>(&mut conn)
            .await?;

        Ok(Paginated::new(items, total, pagination))
    }

    pub async fn count(&self, filter: &DomainFilter) -> DataResult<i64> {
        let mut conn = self.pool.get().await?;

        Self::filtered(filter)
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// Domain counts grouped by verification status
    pub async fn counts_by_status(&self, user_id: Option<Uuid>) -> DataResult<Vec<DomainStatusCount>> {
        let mut conn = self.pool.get().await?;

        let rows = match user_id {
            Some(user_id) => {
                domains::table
                    .filter(domains::user_id.eq(user_id))
                    .group_by(domains::status)
                    .select((domains::status, count_star()))
                    .load::<DomainStatusCount>(&mut conn)
                    .await?
            },
            None => {
                domains::table
                    .group_by(domains::status)
                    .select((domains::status, count_star()))
                    .load::<DomainStatusCount>(&mut conn)
                    .await?
            },
        };

        Ok(rows)
    }

    /// Domain counts grouped by TLS status
    pub async fn counts_by_ssl_status(&self) -> DataResult<Vec<DomainStatusCount>> {
        let mut conn = self.pool.get().await?;

        domains::table
            .group_by(domains::ssl_status)
            .select((domains::ssl_status, count_star()))
            .load::<DomainStatusCount>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Register a domain for a user. Hostname collisions surface as
    /// `DataError::Conflict` off the unique index.
    #[instrument(skip(self, request))]
    pub async fn register(&self, mut request: CreateDomainRequest, user_id: Uuid) -> DataResult<Domain> {
        request.sanitize();
        request.validate()?;

        let domain = self
            .create(NewDomain::pending(
                request.hostname,
                request.domain_type,
                user_id,
            ))
            .await?;

        info!("Registered domain {} ({})", domain.hostname, domain.id);
        Ok(domain)
    }

    pub async fn create(&self, new_domain: NewDomain) -> DataResult<Domain> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(domains::table)
            .values(&new_domain)
            .get_result::<Domain>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn create_many(&self, new_domains: Vec<NewDomain>) -> DataResult<usize> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(domains::table)
            .values(&new_domains)
            .execute(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn create_many_returning(
        &self,
        new_domains: Vec<NewDomain>,
    ) -> DataResult<Vec<Domain>> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(domains::table)
            .values(&new_domains)
            .get_results::<Domain>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn update(&self, domain_id: Uuid, changes: DomainChanges) -> DataResult<Domain> {
        let mut conn = self.pool.get().await?;

        diesel::update(domains::table.find(domain_id))
            .set(&changes)
            .get_result::<Domain>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// The id collection and the update run in one transaction so the
    /// matched set cannot drift between the two statements.
    pub async fn update_many(
        &self,
        filter: &DomainFilter,
        changes: DomainChanges,
    ) -> DataResult<usize> {
        let filter = filter.clone();
        db::transaction(&self.pool, |conn| {
            async move {
                let ids: Vec<Uuid> = Self::filtered(&filter)
                    .select(domains::id)
                    .load::<Uuid>(conn)
                    .await?;
                if ids.is_empty() {
                    return Ok(0);
                }

                diesel::update(domains::table.filter(domains::id.eq_any(ids)))
                    .set(&changes)
                    .execute(conn)
                    .await
                    .map_err(DataError::from)
            }
            .scope_boxed()
        })
        .await
    }

    /// Insert, or update the existing row keyed by hostname
    pub async fn upsert_by_hostname(
        &self,
        new_domain: NewDomain,
        changes: DomainChanges,
    ) -> DataResult<Domain> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(domains::table)
            .values(&new_domain)
            .on_conflict(domains::hostname)
            .do_update()
            .set(&changes)
            .get_result::<Domain>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// Delete a domain, returning the deleted record
    pub async fn delete(&self, domain_id: Uuid) -> DataResult<Domain> {
        let mut conn = self.pool.get().await?;

        diesel::delete(domains::table.find(domain_id))
            .get_result::<Domain>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn delete_many(&self, filter: &DomainFilter) -> DataResult<usize> {
        let filter = filter.clone();
        db::transaction(&self.pool, |conn| {
            async move {
                let ids: Vec<Uuid> = Self::filtered(&filter)
                    .select(domains::id)
                    .load::<Uuid>(conn)
                    .await?;
                if ids.is_empty() {
                    return Ok(0);
                }

                diesel::delete(domains::table.filter(domains::id.eq_any(ids)))
                    .execute(conn)
                    .await
                    .map_err(DataError::from)
            }
            .scope_boxed()
        })
        .await
    }

    // =========================================================================
    // LIFECYCLE TRANSITIONS
    // =========================================================================

    /// DNS verification succeeded; keep whatever verification payload
    /// the checker produced.
    #[instrument(skip(self, verification_data))]
    pub async fn mark_verified(
        &self,
        domain_id: Uuid,
        verification_data: Option<serde_json::Value>,
    ) -> DataResult<Domain> {
        let mut changes = DomainChanges::new().set_status(DomainStatus::Verified);
        if verification_data.is_some() {
            changes.verification_data = Some(verification_data);
        }
        self.update(domain_id, changes).await
    }

    /// Domain begins serving traffic
    pub async fn mark_active(&self, domain_id: Uuid) -> DataResult<Domain> {
        self.update(domain_id, DomainChanges::new().set_status(DomainStatus::Active))
            .await
    }

    /// DNS verification failed; record the checker output for diagnosis
    pub async fn mark_failed(
        &self,
        domain_id: Uuid,
        verification_data: Option<serde_json::Value>,
    ) -> DataResult<Domain> {
        let mut changes = DomainChanges::new().set_status(DomainStatus::Failed);
        changes.verification_data = Some(verification_data);
        self.update(domain_id, changes).await
    }

    /// Certificate issued; keep the issuance payload
    pub async fn mark_ssl_active(
        &self,
        domain_id: Uuid,
        ssl_data: Option<serde_json::Value>,
    ) -> DataResult<Domain> {
        let mut changes = DomainChanges::new().set_ssl_status(SslStatus::Active);
        if ssl_data.is_some() {
            changes.ssl_data = Some(ssl_data);
        }
        self.update(domain_id, changes).await
    }

    /// Store Cloudflare zone/record references after provisioning
    pub async fn set_cloudflare_refs(
        &self,
        domain_id: Uuid,
        zone_id: Option<String>,
        record_id: Option<String>,
    ) -> DataResult<Domain> {
        let mut changes = DomainChanges::new();
        changes.cloudflare_zone_id = Some(zone_id);
        changes.cloudflare_record_id = Some(record_id);
        self.update(domain_id, changes).await
    }
}
