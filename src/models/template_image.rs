// Template image database model - preview assets attached to a template

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::schema::template_images;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = template_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TemplateImage {
    pub id: Uuid,
    pub template_id: Uuid,
    pub image_url: String,
    pub image_type: String,
    pub image_order: i32,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = template_images)]
pub struct NewTemplateImage {
    pub template_id: Uuid,
    pub image_url: String,
    pub image_type: String,
    pub image_order: i32,
    pub caption: Option<String>,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = template_images)]
pub struct TemplateImageChanges {
    pub image_url: Option<String>,
    pub image_type: Option<String>,
    pub image_order: Option<i32>,
    pub caption: Option<Option<String>>,
}

impl TemplateImageChanges {
    /// template_images carries no updated_at, so an all-None changeset
    /// would hand diesel an UPDATE with an empty SET clause. Callers
    /// check this before building the statement.
    pub fn is_empty(&self) -> bool {
        self.image_url.is_none()
            && self.image_type.is_none()
            && self.image_order.is_none()
            && self.caption.is_none()
    }
}

/// Request to attach an image to a template
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTemplateImageRequest {
    #[validate(url(message = "Invalid image URL format"))]
    #[validate(length(max = 2048, message = "Image URL must be less than 2048 characters"))]
    pub image_url: String,

    #[validate(length(min = 1, max = 50, message = "Image type must be 1-50 characters"))]
    pub image_type: String,

    #[serde(default)]
    pub image_order: i32,

    pub caption: Option<String>,
}
