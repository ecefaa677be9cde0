// Funnel database model

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::pagination::SortDirection;
use crate::schema::funnels;

/// Funnel lifecycle status
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, diesel::expression::AsExpression,
)]
#[diesel(sql_type = diesel::sql_types::Text)]
pub enum FunnelStatus {
    Draft,     // Being edited, not reachable from any domain
    Published, // Live on attached domains
    Archived,  // Retired, kept for history
}

impl FunnelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunnelStatus::Draft => "draft",
            FunnelStatus::Published => "published",
            FunnelStatus::Archived => "archived",
        }
    }
}

impl FromStr for FunnelStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(FunnelStatus::Draft),
            "published" => Ok(FunnelStatus::Published),
            "archived" => Ok(FunnelStatus::Archived),
            _ => Err(format!("Invalid funnel status: {}", s)),
        }
    }
}

impl<DB> diesel::deserialize::FromSql<diesel::sql_types::Text, DB> for FunnelStatus
where
    DB: diesel::backend::Backend,
    String: diesel::deserialize::FromSql<diesel::sql_types::Text, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> diesel::deserialize::Result<Self> {
        let value = String::from_sql(bytes)?;
        Self::from_str(&value).map_err(|e| e.into())
    }
}

impl<DB> diesel::serialize::ToSql<diesel::sql_types::Text, DB> for FunnelStatus
where
    DB: diesel::backend::Backend,
    str: diesel::serialize::ToSql<diesel::sql_types::Text, DB>,
{
    fn to_sql<'b>(
        &'b self,
        out: &mut diesel::serialize::Output<'b, '_, DB>,
    ) -> diesel::serialize::Result {
        self.as_str().to_sql(out)
    }
}

/// Funnel database model - queryable from database
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = funnels)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Funnel {
    pub id: Uuid,
    pub name: String,
    pub status: String,
    pub user_id: Uuid,
    pub template_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Funnel {
    /// Get the funnel status as enum, defaulting invalid values to Draft
    pub fn status_enum(&self) -> FunnelStatus {
        FunnelStatus::from_str(&self.status).unwrap_or_else(|e| {
            tracing::warn!(
                "Invalid funnel status '{}' for funnel {}, defaulting to Draft: {}",
                self.status,
                self.id,
                e
            );
            FunnelStatus::Draft
        })
    }

    pub fn is_published(&self) -> bool {
        self.status_enum() == FunnelStatus::Published
    }
}

/// New funnel for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = funnels)]
pub struct NewFunnel {
    pub name: String,
    pub status: String,
    pub user_id: Uuid,
    pub template_id: Option<Uuid>,
}

impl NewFunnel {
    /// New funnels start in Draft
    pub fn draft(name: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            name: name.into(),
            status: FunnelStatus::Draft.as_str().to_string(),
            user_id,
            template_id: None,
        }
    }
}

/// Funnel update changeset
#[derive(Debug, AsChangeset)]
#[diesel(table_name = funnels)]
pub struct FunnelChanges {
    pub name: Option<String>,
    pub status: Option<String>,
    pub template_id: Option<Option<Uuid>>,
    pub updated_at: DateTime<Utc>,
}

impl FunnelChanges {
    pub fn new() -> Self {
        Self {
            name: None,
            status: None,
            template_id: None,
            updated_at: Utc::now(),
        }
    }

    pub fn set_status(mut self, status: FunnelStatus) -> Self {
        self.status = Some(status.as_str().to_string());
        self
    }
}

impl Default for FunnelChanges {
    fn default() -> Self {
        Self::new()
    }
}

/// Filter parameters for funnel list queries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunnelFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<FunnelStatus>,
    pub template_id: Option<Uuid>,
    pub search: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

/// Sortable funnel columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunnelSort {
    Name,
    CreatedAt,
    UpdatedAt,
}

impl Default for FunnelSort {
    fn default() -> Self {
        FunnelSort::CreatedAt
    }
}

/// Sort selection for funnel list queries
#[derive(Debug, Clone, Copy, Default)]
pub struct FunnelOrder {
    pub sort: FunnelSort,
    pub direction: SortDirection,
}

/// Row shape for status group-by counts
#[derive(Debug, Clone, Serialize, Queryable)]
pub struct FunnelStatusCount {
    pub status: String,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_funnel_status_conversion() {
        assert_eq!(FunnelStatus::Draft.as_str(), "draft");
        assert_eq!(FunnelStatus::Published.as_str(), "published");
        assert_eq!(FunnelStatus::Archived.as_str(), "archived");

        assert_eq!(FunnelStatus::from_str("draft"), Ok(FunnelStatus::Draft));
        assert_eq!(
            FunnelStatus::from_str("published"),
            Ok(FunnelStatus::Published)
        );
        assert!(FunnelStatus::from_str("live").is_err());
    }

    #[test]
    fn test_status_enum_fallback() {
        let now = Utc::now();
        let funnel = Funnel {
            id: Uuid::new_v4(),
            name: "Launch".to_string(),
            status: "bogus".to_string(),
            user_id: Uuid::new_v4(),
            template_id: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(funnel.status_enum(), FunnelStatus::Draft);
        assert!(!funnel.is_published());
    }

    #[test]
    fn test_new_funnel_draft() {
        let user_id = Uuid::new_v4();
        let funnel = NewFunnel::draft("Webinar", user_id);
        assert_eq!(funnel.status, "draft");
        assert_eq!(funnel.user_id, user_id);
        assert!(funnel.template_id.is_none());
    }

    #[test]
    fn test_changes_builder() {
        let changes = FunnelChanges::new().set_status(FunnelStatus::Published);
        assert_eq!(changes.status.as_deref(), Some("published"));
        assert!(changes.name.is_none());
    }
}
