// Template database model - reusable funnel blueprints

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::schema::templates;

/// Template database model - queryable from database
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = templates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub tags: Vec<Option<String>>,
    pub usage_count: i32,
    pub is_active: bool,
    pub is_public: bool,
    pub created_by_user_id: Uuid,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Template {
    /// Tags with the array's SQL NULL slots filtered out
    pub fn tag_list(&self) -> Vec<String> {
        self.tags.iter().filter_map(|t| t.clone()).collect()
    }
}

/// New template for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = templates)]
pub struct NewTemplate {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub tags: Vec<Option<String>>,
    pub is_active: bool,
    pub is_public: bool,
    pub created_by_user_id: Uuid,
    pub metadata: serde_json::Value,
}

/// Template update changeset
#[derive(Debug, AsChangeset)]
#[diesel(table_name = templates)]
pub struct TemplateChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub category_id: Option<Uuid>,
    pub tags: Option<Vec<Option<String>>>,
    pub is_active: Option<bool>,
    pub is_public: Option<bool>,
    pub metadata: Option<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}

impl TemplateChanges {
    pub fn new() -> Self {
        Self {
            name: None,
            slug: None,
            description: None,
            category_id: None,
            tags: None,
            is_active: None,
            is_public: None,
            metadata: None,
            updated_at: Utc::now(),
        }
    }
}

impl Default for TemplateChanges {
    fn default() -> Self {
        Self::new()
    }
}

/// Request to create a template
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTemplateRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "Slug must be 1-100 characters"))]
    #[validate(regex(
        path = "crate::utils::validation::SLUG_REGEX",
        message = "Slug can only contain lowercase letters, numbers and hyphens"
    ))]
    pub slug: String,

    pub description: Option<String>,
    pub category_id: Uuid,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub is_public: bool,

    #[serde(default = "default_metadata")]
    pub metadata: serde_json::Value,
}

fn default_metadata() -> serde_json::Value {
    serde_json::json!({})
}

impl CreateTemplateRequest {
    pub fn sanitize(&mut self) {
        self.name = self.name.trim().to_string();
        self.slug = self.slug.trim().to_lowercase();
        self.description = crate::utils::validation::trim_optional_field(self.description.as_ref());
        self.tags = self
            .tags
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
    }

    pub fn validate_custom(&self) -> Result<(), String> {
        if self.tags.len() > 10 {
            return Err("Maximum 10 tags allowed".to_string());
        }
        for tag in &self.tags {
            if tag.len() > 30 {
                return Err("Each tag must be less than 30 characters".to_string());
            }
        }
        Ok(())
    }
}

/// Filter parameters for template list queries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateFilter {
    pub category_id: Option<Uuid>,
    pub created_by_user_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub is_public: Option<bool>,
    pub search: Option<String>,
    pub tag: Option<String>,
}

/// Sortable template columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSort {
    Name,
    UsageCount,
    CreatedAt,
}

impl Default for TemplateSort {
    fn default() -> Self {
        TemplateSort::CreatedAt
    }
}

/// Aggregates over template usage counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateUsageAggregates {
    pub count: i64,
    pub total_usage: Option<i64>,
    pub min_usage: Option<i32>,
    pub max_usage: Option<i32>,
    pub avg_usage: Option<f64>,
}

/// Row shape for per-category group-by counts
#[derive(Debug, Clone, Serialize, Queryable)]
pub struct TemplateCategoryCount {
    pub category_id: Uuid,
    pub count: i64,
}
