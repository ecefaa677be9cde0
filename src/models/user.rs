// User database model

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::schema::users;

/// User database model - queryable from database
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    pub password_reset_expires_at: Option<DateTime<Utc>>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether a stored reset token exists and has not expired
    pub fn has_valid_reset_token(&self, now: DateTime<Utc>) -> bool {
        match (&self.password_reset_token, self.password_reset_expires_at) {
            (Some(_), Some(expires_at)) => expires_at > now,
            _ => false,
        }
    }
}

/// New user for insertion
#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub is_admin: bool,
}

/// User update changeset. Double-Option fields distinguish "leave unchanged"
/// (outer None) from "set NULL" (Some(None)).
#[derive(Debug, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<Option<String>>,
    pub password_hash: Option<String>,
    pub password_reset_token: Option<Option<String>>,
    pub password_reset_expires_at: Option<Option<DateTime<Utc>>>,
    pub is_admin: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

impl UserChanges {
    pub fn new() -> Self {
        Self {
            email: None,
            name: None,
            password_hash: None,
            password_reset_token: None,
            password_reset_expires_at: None,
            is_admin: None,
            updated_at: Utc::now(),
        }
    }
}

impl Default for UserChanges {
    fn default() -> Self {
        Self::new()
    }
}

/// Request to register a new user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email address"))]
    #[validate(length(max = 320, message = "Email must be less than 320 characters"))]
    pub email: String,

    #[validate(length(max = 255, message = "Name must be less than 255 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    #[serde(default)]
    pub is_admin: bool,
}

impl CreateUserRequest {
    /// Trim and sanitize input fields
    pub fn sanitize(&mut self) {
        self.email = self.email.trim().to_lowercase();
        self.name = crate::utils::validation::trim_optional_field(self.name.as_ref());
    }
}

/// Filter parameters for user list queries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub email_contains: Option<String>,
    pub is_admin: Option<bool>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

/// Sortable user columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSort {
    Email,
    CreatedAt,
    UpdatedAt,
}

impl Default for UserSort {
    fn default() -> Self {
        UserSort::CreatedAt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "owner@example.com".to_string(),
            name: Some("Owner".to_string()),
            password_hash: "$argon2id$stub".to_string(),
            password_reset_token: None,
            password_reset_expires_at: None,
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_sanitize_normalizes_email() {
        let mut request = CreateUserRequest {
            email: "  Owner@Example.COM ".to_string(),
            name: Some("  ".to_string()),
            password: "hunter2hunter2".to_string(),
            is_admin: false,
        };
        request.sanitize();
        assert_eq!(request.email, "owner@example.com");
        assert_eq!(request.name, None);
    }

    #[test]
    fn test_create_user_request_validation() {
        let valid = CreateUserRequest {
            email: "owner@example.com".to_string(),
            name: None,
            password: "longenoughpassword".to_string(),
            is_admin: false,
        };
        assert!(valid.validate().is_ok());

        let bad_email = CreateUserRequest {
            email: "not-an-email".to_string(),
            ..valid.clone()
        };
        assert!(bad_email.validate().is_err());

        let short_password = CreateUserRequest {
            password: "short".to_string(),
            ..valid.clone()
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_has_valid_reset_token() {
        let now = Utc::now();
        let mut user = sample_user();
        assert!(!user.has_valid_reset_token(now));

        user.password_reset_token = Some("hash".to_string());
        user.password_reset_expires_at = Some(now + Duration::minutes(10));
        assert!(user.has_valid_reset_token(now));

        user.password_reset_expires_at = Some(now - Duration::minutes(1));
        assert!(!user.has_valid_reset_token(now));
    }

    #[test]
    fn test_user_changes_defaults_to_noop() {
        let changes = UserChanges::new();
        assert!(changes.email.is_none());
        assert!(changes.name.is_none());
        assert!(changes.password_hash.is_none());
        assert!(changes.password_reset_token.is_none());
        assert!(changes.is_admin.is_none());
    }
}
