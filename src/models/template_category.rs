// Template category database model

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::schema::template_categories;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = template_categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TemplateCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub category_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = template_categories)]
pub struct NewTemplateCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub category_order: i32,
    pub is_active: bool,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = template_categories)]
pub struct TemplateCategoryChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub icon: Option<Option<String>>,
    pub category_order: Option<i32>,
    pub is_active: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

impl TemplateCategoryChanges {
    pub fn new() -> Self {
        Self {
            name: None,
            slug: None,
            description: None,
            icon: None,
            category_order: None,
            is_active: None,
            updated_at: Utc::now(),
        }
    }
}

impl Default for TemplateCategoryChanges {
    fn default() -> Self {
        Self::new()
    }
}

/// Request to create a template category
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "Slug must be 1-100 characters"))]
    #[validate(regex(
        path = "crate::utils::validation::SLUG_REGEX",
        message = "Slug can only contain lowercase letters, numbers and hyphens"
    ))]
    pub slug: String,

    pub description: Option<String>,
    pub icon: Option<String>,

    #[serde(default)]
    pub category_order: i32,
}

impl CreateCategoryRequest {
    pub fn sanitize(&mut self) {
        self.name = self.name.trim().to_string();
        self.slug = self.slug.trim().to_lowercase();
        self.description = crate::utils::validation::trim_optional_field(self.description.as_ref());
        self.icon = crate::utils::validation::trim_optional_field(self.icon.as_ref());
    }
}

/// Filter parameters for category list queries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateCategoryFilter {
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_category_request() {
        let mut request = CreateCategoryRequest {
            name: " Landing Pages ".to_string(),
            slug: " Landing-Pages ".to_string(),
            description: None,
            icon: None,
            category_order: 0,
        };
        request.sanitize();
        assert_eq!(request.name, "Landing Pages");
        assert_eq!(request.slug, "landing-pages");
        assert!(request.validate().is_ok());

        let bad_slug = CreateCategoryRequest {
            slug: "has_underscore".to_string(),
            ..request.clone()
        };
        assert!(bad_slug.validate().is_err());
    }
}
