// Template page database model - page blueprints copied into funnels
// when a funnel is instantiated from a template

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::template_pages;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = template_pages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TemplatePage {
    pub id: Uuid,
    pub template_id: Uuid,
    pub name: String,
    pub content: Option<String>,
    pub page_order: i32,
    pub settings: Option<serde_json::Value>,
    pub linking_id_prefix: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// pages.linking_id is VARCHAR(64); the simple uuid takes 32 chars plus
/// the separator, leaving at most 31 for the blueprint prefix.
const LINKING_ID_PREFIX_MAX: usize = 31;

impl TemplatePage {
    /// Linking id for a page copied from this blueprint. The prefix, when
    /// present, keeps ids stable across instantiations of the same template.
    /// Prefixes longer than the column allows are truncated.
    pub fn instantiated_linking_id(&self, funnel_id: Uuid) -> Option<String> {
        self.linking_id_prefix.as_ref().map(|prefix| {
            let prefix: String = prefix.chars().take(LINKING_ID_PREFIX_MAX).collect();
            format!("{}-{}", prefix, funnel_id.simple())
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = template_pages)]
pub struct NewTemplatePage {
    pub template_id: Uuid,
    pub name: String,
    pub content: Option<String>,
    pub page_order: i32,
    pub settings: Option<serde_json::Value>,
    pub linking_id_prefix: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = template_pages)]
pub struct TemplatePageChanges {
    pub name: Option<String>,
    pub content: Option<Option<String>>,
    pub page_order: Option<i32>,
    pub settings: Option<Option<serde_json::Value>>,
    pub linking_id_prefix: Option<Option<String>>,
    pub metadata: Option<Option<serde_json::Value>>,
    pub updated_at: DateTime<Utc>,
}

impl TemplatePageChanges {
    pub fn new() -> Self {
        Self {
            name: None,
            content: None,
            page_order: None,
            settings: None,
            linking_id_prefix: None,
            metadata: None,
            updated_at: Utc::now(),
        }
    }
}

impl Default for TemplatePageChanges {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instantiated_linking_id() {
        let now = Utc::now();
        let funnel_id = Uuid::new_v4();
        let mut page = TemplatePage {
            id: Uuid::new_v4(),
            template_id: Uuid::new_v4(),
            name: "Opt-in".to_string(),
            content: None,
            page_order: 0,
            settings: None,
            linking_id_prefix: Some("optin".to_string()),
            metadata: None,
            created_at: now,
            updated_at: now,
        };

        let linking_id = page.instantiated_linking_id(funnel_id).unwrap();
        assert!(linking_id.starts_with("optin-"));
        assert!(linking_id.contains(&funnel_id.simple().to_string()));

        page.linking_id_prefix = None;
        assert!(page.instantiated_linking_id(funnel_id).is_none());
    }

    #[test]
    fn test_instantiated_linking_id_fits_column() {
        let now = Utc::now();
        let funnel_id = Uuid::new_v4();
        let page = TemplatePage {
            id: Uuid::new_v4(),
            template_id: Uuid::new_v4(),
            name: "Opt-in".to_string(),
            content: None,
            page_order: 0,
            settings: None,
            linking_id_prefix: Some("p".repeat(64)),
            metadata: None,
            created_at: now,
            updated_at: now,
        };

        let linking_id = page.instantiated_linking_id(funnel_id).unwrap();
        assert!(linking_id.chars().count() <= 64);
        assert!(linking_id.ends_with(&funnel_id.simple().to_string()));
    }
}
