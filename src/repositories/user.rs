// User repository - typed CRUD plus credential and reset-token lifecycle

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::RunQueryDsl;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::db::{self, DieselPool};
use crate::models::pagination::{Paginated, Pagination, SortDirection};
use crate::models::user::{CreateUserRequest, NewUser, User, UserChanges, UserFilter, UserSort};
use crate::schema::users;
use crate::utils::data_error::{DataError, DataResult};
use crate::utils::reset_token::{generate_reset_token, hash_token, token_matches, ResetTokenInfo};
use crate::utils::{hash_password, verify_password};

#[derive(Clone)]
pub struct UserRepository {
    pool: DieselPool,
}

impl UserRepository {
    pub fn new(pool: DieselPool) -> Self {
        Self { pool }
    }

    fn filtered(filter: &UserFilter) -> users::BoxedQuery<'static, diesel::pg::Pg> {
        let mut query = users::table.into_boxed();

        if let Some(ref needle) = filter.email_contains {
            query = query.filter(users::email.ilike(format!("%{}%", needle)));
        }
        if let Some(is_admin) = filter.is_admin {
            query = query.filter(users::is_admin.eq(is_admin));
        }
        if let Some(created_after) = filter.created_after {
            query = query.filter(users::created_at.ge(created_after));
        }
        if let Some(created_before) = filter.created_before {
            query = query.filter(users::created_at.le(created_before));
        }

        query
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    pub async fn find_by_id(&self, user_id: Uuid) -> DataResult<Option<User>> {
        let mut conn = self.pool.get().await?;

        users::table
            .find(user_id)
            .first::<User>(&mut conn)
            .await
            .optional()
            .map_err(DataError::from)
    }

    pub async fn get_by_id(&self, user_id: Uuid) -> DataResult<User> {
        self.find_by_id(user_id).await?.ok_or(DataError::NotFound)
    }

    /// Find user by email. Emails are stored lowercased, so this is an
    /// exact match on the normalized form; LIKE metacharacters in the
    /// input have no effect.
    pub async fn find_by_email(&self, email: &str) -> DataResult<Option<User>> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::email.eq(email.to_lowercase()))
            .first::<User>(&mut conn)
            .await
            .optional()
            .map_err(DataError::from)
    }

    pub async fn get_by_email(&self, email: &str) -> DataResult<User> {
        self.find_by_email(email).await?.ok_or(DataError::NotFound)
    }

    /// First user matching the filter, ordered by creation time
    pub async fn find_first(&self, filter: &UserFilter) -> DataResult<Option<User>> {
        let mut conn = self.pool.get().await?;

        Self::filtered(filter)
            .order(users::created_at.asc())
            .first::<User>(&mut conn)
            .await
            .optional()
            .map_err(DataError::from)
    }

    pub async fn get_first(&self, filter: &UserFilter) -> DataResult<User> {
        self.find_first(filter).await?.ok_or(DataError::NotFound)
    }

    pub async fn find_many(
        &self,
        filter: &UserFilter,
        pagination: &Pagination,
        sort: UserSort,
        direction: SortDirection,
    ) -> DataResult<Paginated<User>> {
        let mut conn = self.pool.get().await?;

        let total = Self::filtered(filter)
            .count()
            .get_result::<i64>(&mut conn)
            .await?;

        let query = Self::filtered(filter);
        let query = match (sort, direction) {
            (UserSort::Email, SortDirection::Asc) => query.order(users::email.asc()),
            (UserSort::Email, SortDirection::Desc) => query.order(users::email.desc()),
            (UserSort::CreatedAt, SortDirection::Asc) => query.order(users::created_at.asc()),
            (UserSort::CreatedAt, SortDirection::Desc) => query.order(users::created_at.desc()),
            (UserSort::UpdatedAt, SortDirection::Asc) => query.order(users::updated_at.asc()),
            (UserSort::UpdatedAt, SortDirection::Desc) => query.order(users::updated_at.desc()),
        };

        let items = query
            .limit(pagination.limit())
            .offset(pagination.offset())
            .load::<User>(&mut conn)
            .await?;

        Ok(Paginated::new(items, total, pagination))
    }

    pub async fn count(&self, filter: &UserFilter) -> DataResult<i64> {
        let mut conn = self.pool.get().await?;

        Self::filtered(filter)
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Register a new user: sanitize, validate, hash the password, insert.
    /// Duplicate emails surface as `DataError::Conflict`.
    #[instrument(skip(self, request))]
    pub async fn register(&self, mut request: CreateUserRequest) -> DataResult<User> {
        request.sanitize();
        request.validate()?;

        let password_hash = hash_password(&request.password)?;
        let new_user = NewUser {
            email: request.email,
            name: request.name,
            password_hash,
            is_admin: request.is_admin,
        };

        let user = self.create(new_user).await?;
        info!("Registered user {}", user.id);
        Ok(user)
    }

    pub async fn create(&self, new_user: NewUser) -> DataResult<User> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(users::table)
            .values(&new_user)
            .get_result::<User>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn create_many(&self, new_users: Vec<NewUser>) -> DataResult<usize> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(users::table)
            .values(&new_users)
            .execute(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn create_many_returning(&self, new_users: Vec<NewUser>) -> DataResult<Vec<User>> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(users::table)
            .values(&new_users)
            .get_results::<User>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn update(&self, user_id: Uuid, changes: UserChanges) -> DataResult<User> {
        let mut conn = self.pool.get().await?;

        diesel::update(users::table.find(user_id))
            .set(&changes)
            .get_result::<User>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// Apply the same changeset to every user matching the filter.
    /// Returns the number of affected rows. The id collection and the
    /// update run in one transaction so the matched set cannot drift
    /// between the two statements.
    pub async fn update_many(
        &self,
        filter: &UserFilter,
        changes: UserChanges,
    ) -> DataResult<usize> {
        let filter = filter.clone();

        db::transaction(&self.pool, |conn| {
            async move {
                let ids: Vec<Uuid> = Self::filtered(&filter)
                    .select(users::id)
                    .load::<Uuid>(conn)
                    .await?;
                if ids.is_empty() {
                    return Ok(0);
                }

                diesel::update(users::table.filter(users::id.eq_any(ids)))
                    .set(&changes)
                    .execute(conn)
                    .await
                    .map_err(DataError::from)
            }
            .scope_boxed()
        })
        .await
    }

    /// Insert, or update the existing row keyed by email
    pub async fn upsert_by_email(&self, new_user: NewUser) -> DataResult<User> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(users::table)
            .values(&new_user)
            .on_conflict(users::email)
            .do_update()
            .set((
                users::name.eq(&new_user.name),
                users::password_hash.eq(&new_user.password_hash),
                users::is_admin.eq(new_user.is_admin),
                users::updated_at.eq(Utc::now()),
            ))
            .get_result::<User>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    /// Delete a user, returning the deleted record
    pub async fn delete(&self, user_id: Uuid) -> DataResult<User> {
        let mut conn = self.pool.get().await?;

        diesel::delete(users::table.find(user_id))
            .get_result::<User>(&mut conn)
            .await
            .map_err(DataError::from)
    }

    pub async fn delete_many(&self, filter: &UserFilter) -> DataResult<usize> {
        let filter = filter.clone();

        db::transaction(&self.pool, |conn| {
            async move {
                let ids: Vec<Uuid> = Self::filtered(&filter)
                    .select(users::id)
                    .load::<Uuid>(conn)
                    .await?;
                if ids.is_empty() {
                    return Ok(0);
                }

                diesel::delete(users::table.filter(users::id.eq_any(ids)))
                    .execute(conn)
                    .await
                    .map_err(DataError::from)
            }
            .scope_boxed()
        })
        .await
    }

    // =========================================================================
    // CREDENTIALS & PASSWORD RESET
    // =========================================================================

    /// Check email/password credentials. Returns the user on success,
    /// None for unknown email or wrong password -- callers cannot tell
    /// the two apart.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> DataResult<Option<User>> {
        let user = match self.find_by_email(email).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        if verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Start a password reset. Stores the token hash and expiry on the user
    /// row and hands back the raw token for delivery. Returns None when the
    /// email is unknown so callers don't reveal account existence.
    #[instrument(skip(self, email))]
    pub async fn begin_password_reset(&self, email: &str) -> DataResult<Option<ResetTokenInfo>> {
        let user = match self.find_by_email(email).await? {
            Some(user) => user,
            None => {
                info!("Password reset requested for unknown email");
                return Ok(None);
            },
        };

        let token_info = generate_reset_token();

        let mut changes = UserChanges::new();
        changes.password_reset_token = Some(Some(token_info.token_hash.clone()));
        changes.password_reset_expires_at = Some(Some(token_info.expires_at));
        self.update(user.id, changes).await?;

        info!("Issued password reset token for user {}", user.id);
        Ok(Some(token_info))
    }

    /// Complete a password reset with the raw token from the user.
    /// Single use: the token is cleared together with the password update.
    #[instrument(skip(self, raw_token, new_password))]
    pub async fn complete_password_reset(
        &self,
        raw_token: &str,
        new_password: &str,
    ) -> DataResult<User> {
        let mut conn = self.pool.get().await?;

        let token_hash = hash_token(raw_token);
        let user = users::table
            .filter(users::password_reset_token.eq(&token_hash))
            .first::<User>(&mut conn)
            .await
            .optional()?
            .ok_or(DataError::NotFound)?;

        // Constant-time re-check of the stored hash
        let stored = user
            .password_reset_token
            .as_deref()
            .ok_or(DataError::NotFound)?;
        if !token_matches(raw_token, stored) {
            return Err(DataError::NotFound);
        }

        if !user.has_valid_reset_token(Utc::now()) {
            warn!("Expired password reset token for user {}", user.id);
            return Err(DataError::Validation(
                "Password reset token has expired".to_string(),
            ));
        }

        let password_hash = hash_password(new_password)?;
        let mut changes = UserChanges::new();
        changes.password_hash = Some(password_hash);
        changes.password_reset_token = Some(None);
        changes.password_reset_expires_at = Some(None);

        let updated = self.update(user.id, changes).await?;
        info!("Completed password reset for user {}", updated.id);
        Ok(updated)
    }
}
