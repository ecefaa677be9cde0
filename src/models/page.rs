// Page database model - ordered pages inside a funnel

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::schema::pages;

/// Page database model - queryable from database
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = pages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Page {
    pub id: Uuid,
    pub name: String,
    pub content: Option<String>,
    pub page_order: i32,
    pub linking_id: Option<String>,
    pub funnel_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New page for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pages)]
pub struct NewPage {
    pub name: String,
    pub content: Option<String>,
    pub page_order: i32,
    pub linking_id: Option<String>,
    pub funnel_id: Uuid,
}

/// Page update changeset
#[derive(Debug, AsChangeset)]
#[diesel(table_name = pages)]
pub struct PageChanges {
    pub name: Option<String>,
    pub content: Option<Option<String>>,
    pub page_order: Option<i32>,
    pub linking_id: Option<Option<String>>,
    pub updated_at: DateTime<Utc>,
}

impl PageChanges {
    pub fn new() -> Self {
        Self {
            name: None,
            content: None,
            page_order: None,
            linking_id: None,
            updated_at: Utc::now(),
        }
    }
}

impl Default for PageChanges {
    fn default() -> Self {
        Self::new()
    }
}

/// Request to create a page inside a funnel
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePageRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    pub content: Option<String>,

    #[validate(length(min = 1, max = 64, message = "Linking id must be 1-64 characters"))]
    #[validate(regex(
        path = "crate::utils::validation::LINKING_ID_REGEX",
        message = "Linking id can only contain letters, numbers, hyphens, and underscores"
    ))]
    pub linking_id: Option<String>,
}

impl CreatePageRequest {
    pub fn sanitize(&mut self) {
        self.name = self.name.trim().to_string();
        self.linking_id = crate::utils::validation::trim_optional_field(self.linking_id.as_ref());
    }
}

/// Filter parameters for page list queries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageFilter {
    pub funnel_id: Option<Uuid>,
    pub search: Option<String>,
    pub has_linking_id: Option<bool>,
}

/// Aggregates over page ordering within a funnel
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageOrderAggregates {
    pub count: i64,
    pub min_order: Option<i32>,
    pub max_order: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_page_request_validation() {
        let mut request = CreatePageRequest {
            name: "  Opt-in  ".to_string(),
            content: None,
            linking_id: Some(" optin_1 ".to_string()),
        };
        request.sanitize();
        assert_eq!(request.name, "Opt-in");
        assert_eq!(request.linking_id.as_deref(), Some("optin_1"));
        assert!(request.validate().is_ok());

        let bad = CreatePageRequest {
            name: "Opt-in".to_string(),
            content: None,
            linking_id: Some("-bad id".to_string()),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_page_changes_default() {
        let changes = PageChanges::new();
        assert!(changes.name.is_none());
        assert!(changes.page_order.is_none());
        assert!(changes.linking_id.is_none());
    }
}
