// Domain database model - custom domains and platform subdomains
// attached to funnels, with Cloudflare provisioning metadata

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::schema::domains;

/// How the hostname is provisioned
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, diesel::expression::AsExpression,
)]
#[diesel(sql_type = diesel::sql_types::Text)]
pub enum DomainType {
    CustomDomain, // Customer-owned apex or subdomain, verified via DNS
    Subdomain,    // Platform-issued subdomain, pre-verified
}

impl DomainType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainType::CustomDomain => "custom_domain",
            DomainType::Subdomain => "subdomain",
        }
    }
}

impl FromStr for DomainType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "custom_domain" => Ok(DomainType::CustomDomain),
            "subdomain" => Ok(DomainType::Subdomain),
            _ => Err(format!("Invalid domain type: {}", s)),
        }
    }
}

/// DNS verification / serving status
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, diesel::expression::AsExpression,
)]
#[diesel(sql_type = diesel::sql_types::Text)]
pub enum DomainStatus {
    Pending,   // Created, waiting for DNS verification
    Verified,  // DNS records confirmed, not yet serving
    Active,    // Serving traffic
    Failed,    // Verification failed
    Suspended, // Disabled by an operator
}

impl DomainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainStatus::Pending => "pending",
            DomainStatus::Verified => "verified",
            DomainStatus::Active => "active",
            DomainStatus::Failed => "failed",
            DomainStatus::Suspended => "suspended",
        }
    }
}

impl FromStr for DomainStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DomainStatus::Pending),
            "verified" => Ok(DomainStatus::Verified),
            "active" => Ok(DomainStatus::Active),
            "failed" => Ok(DomainStatus::Failed),
            "suspended" => Ok(DomainStatus::Suspended),
            _ => Err(format!("Invalid domain status: {}", s)),
        }
    }
}

/// TLS certificate status
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, diesel::expression::AsExpression,
)]
#[diesel(sql_type = diesel::sql_types::Text)]
pub enum SslStatus {
    Pending, // Certificate requested
    Active,  // Certificate issued and serving
    Error,   // Issuance failed
    Expired, // Certificate lapsed
}

impl SslStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SslStatus::Pending => "pending",
            SslStatus::Active => "active",
            SslStatus::Error => "error",
            SslStatus::Expired => "expired",
        }
    }
}

impl FromStr for SslStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SslStatus::Pending),
            "active" => Ok(SslStatus::Active),
            "error" => Ok(SslStatus::Error),
            "expired" => Ok(SslStatus::Expired),
            _ => Err(format!("Invalid SSL status: {}", s)),
        }
    }
}

macro_rules! impl_text_sql {
    ($ty:ty) => {
        impl<DB> diesel::deserialize::FromSql<diesel::sql_types::Text, DB> for $ty
        where
            DB: diesel::backend::Backend,
            String: diesel::deserialize::FromSql<diesel::sql_types::Text, DB>,
        {
            fn from_sql(bytes: DB::RawValue<'_>) -> diesel::deserialize::Result<Self> {
                let value = String::from_sql(bytes)?;
                Self::from_str(&value).map_err(|e| e.into())
            }
        }

        impl<DB> diesel::serialize::ToSql<diesel::sql_types::Text, DB> for $ty
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
    };
}

impl_text_sql!(DomainType);
impl_text_sql!(DomainStatus);
impl_text_sql!(SslStatus);

/// Domain database model - queryable from database
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = domains)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Domain {
    pub id: Uuid,
    pub hostname: String,
    pub domain_type: String,
    pub status: String,
    pub ssl_status: String,
    pub user_id: Uuid,
    pub cloudflare_zone_id: Option<String>,
    pub cloudflare_record_id: Option<String>,
    pub verification_data: Option<serde_json::Value>,
    pub ssl_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Domain {
    pub fn domain_type_enum(&self) -> Result<DomainType, String> {
        DomainType::from_str(&self.domain_type)
    }

    /// Status as enum, falling back to Pending for unknown values
    pub fn status_enum(&self) -> DomainStatus {
        DomainStatus::from_str(&self.status).unwrap_or_else(|e| {
            tracing::warn!(
                "Invalid status '{}' for domain {}, defaulting to Pending: {}",
                self.status,
                self.id,
                e
            );
            DomainStatus::Pending
        })
    }

    pub fn ssl_status_enum(&self) -> SslStatus {
        SslStatus::from_str(&self.ssl_status).unwrap_or_else(|e| {
            tracing::warn!(
                "Invalid SSL status '{}' for domain {}, defaulting to Pending: {}",
                self.ssl_status,
                self.id,
                e
            );
            SslStatus::Pending
        })
    }

    /// A domain serves traffic only when verified DNS and live TLS line up
    pub fn is_servable(&self) -> bool {
        self.status_enum() == DomainStatus::Active && self.ssl_status_enum() == SslStatus::Active
    }
}

/// New domain for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = domains)]
pub struct NewDomain {
    pub hostname: String,
    pub domain_type: String,
    pub status: String,
    pub ssl_status: String,
    pub user_id: Uuid,
    pub cloudflare_zone_id: Option<String>,
    pub cloudflare_record_id: Option<String>,
    pub verification_data: Option<serde_json::Value>,
    pub ssl_data: Option<serde_json::Value>,
}

impl NewDomain {
    /// A freshly registered domain starts pending on both DNS and TLS
    pub fn pending(hostname: impl Into<String>, domain_type: DomainType, user_id: Uuid) -> Self {
        Self {
            hostname: hostname.into(),
            domain_type: domain_type.as_str().to_string(),
            status: DomainStatus::Pending.as_str().to_string(),
            ssl_status: SslStatus::Pending.as_str().to_string(),
            user_id,
            cloudflare_zone_id: None,
            cloudflare_record_id: None,
            verification_data: None,
            ssl_data: None,
        }
    }
}

/// Domain update changeset
#[derive(Debug, AsChangeset)]
#[diesel(table_name = domains)]
pub struct DomainChanges {
    pub hostname: Option<String>,
    pub status: Option<String>,
    pub ssl_status: Option<String>,
    pub cloudflare_zone_id: Option<Option<String>>,
    pub cloudflare_record_id: Option<Option<String>>,
    pub verification_data: Option<Option<serde_json::Value>>,
    pub ssl_data: Option<Option<serde_json::Value>>,
    pub updated_at: DateTime<Utc>,
}

impl DomainChanges {
    pub fn new() -> Self {
        Self {
            hostname: None,
            status: None,
            ssl_status: None,
            cloudflare_zone_id: None,
            cloudflare_record_id: None,
            verification_data: None,
            ssl_data: None,
            updated_at: Utc::now(),
        }
    }

    pub fn set_status(mut self, status: DomainStatus) -> Self {
        self.status = Some(status.as_str().to_string());
        self
    }

    pub fn set_ssl_status(mut self, ssl_status: SslStatus) -> Self {
        self.ssl_status = Some(ssl_status.as_str().to_string());
        self
    }
}

impl Default for DomainChanges {
    fn default() -> Self {
        Self::new()
    }
}

/// Request to register a domain
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDomainRequest {
    #[validate(length(min = 4, max = 253, message = "Hostname must be 4-253 characters"))]
    #[validate(regex(path = "crate::utils::validation::HOSTNAME_REGEX", message = "Invalid hostname"))]
    pub hostname: String,

    pub domain_type: DomainType,
}

impl CreateDomainRequest {
    pub fn sanitize(&mut self) {
        self.hostname = self.hostname.trim().trim_end_matches('.').to_lowercase();
    }
}

/// Filter parameters for domain list queries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainFilter {
    pub user_id: Option<Uuid>,
    pub domain_type: Option<DomainType>,
    pub status: Option<DomainStatus>,
    pub ssl_status: Option<SslStatus>,
    pub hostname_contains: Option<String>,
}

/// Row shape for status group-by counts
#[derive(Debug, Clone, Serialize, Queryable)]
pub struct DomainStatusCount {
    pub status: String,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_round_trips() {
        assert_eq!(
            DomainType::from_str(DomainType::CustomDomain.as_str()),
            Ok(DomainType::CustomDomain)
        );
        assert_eq!(
            DomainStatus::from_str(DomainStatus::Suspended.as_str()),
            Ok(DomainStatus::Suspended)
        );
        assert_eq!(
            SslStatus::from_str(SslStatus::Expired.as_str()),
            Ok(SslStatus::Expired)
        );
        assert!(DomainType::from_str("apex").is_err());
        assert!(DomainStatus::from_str("unknown").is_err());
        assert!(SslStatus::from_str("renewing").is_err());
    }

    fn sample_domain(status: DomainStatus, ssl: SslStatus) -> Domain {
        let now = Utc::now();
        Domain {
            id: Uuid::new_v4(),
            hostname: "pages.example.com".to_string(),
            domain_type: DomainType::CustomDomain.as_str().to_string(),
            status: status.as_str().to_string(),
            ssl_status: ssl.as_str().to_string(),
            user_id: Uuid::new_v4(),
            cloudflare_zone_id: None,
            cloudflare_record_id: None,
            verification_data: None,
            ssl_data: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_is_servable() {
        assert!(sample_domain(DomainStatus::Active, SslStatus::Active).is_servable());
        assert!(!sample_domain(DomainStatus::Verified, SslStatus::Active).is_servable());
        assert!(!sample_domain(DomainStatus::Active, SslStatus::Pending).is_servable());
    }

    #[test]
    fn test_create_domain_request() {
        let mut request = CreateDomainRequest {
            hostname: " Pages.Example.COM. ".to_string(),
            domain_type: DomainType::CustomDomain,
        };
        request.sanitize();
        assert_eq!(request.hostname, "pages.example.com");
        assert!(request.validate().is_ok());

        let mut bad = CreateDomainRequest {
            hostname: "not a hostname".to_string(),
            domain_type: DomainType::CustomDomain,
        };
        bad.sanitize();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_new_domain_pending() {
        let d = NewDomain::pending("shop.example.com", DomainType::Subdomain, Uuid::new_v4());
        assert_eq!(d.status, "pending");
        assert_eq!(d.ssl_status, "pending");
        assert_eq!(d.domain_type, "subdomain");
    }
}
