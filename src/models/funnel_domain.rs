// Funnel <-> Domain join model.
// Compound unique on (funnel_id, domain_id) prevents duplicate pairings.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::funnel_domains;

/// Join row attaching a funnel to a domain
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = funnel_domains)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FunnelDomain {
    pub id: Uuid,
    pub funnel_id: Uuid,
    pub domain_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// New attachment for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = funnel_domains)]
pub struct NewFunnelDomain {
    pub funnel_id: Uuid,
    pub domain_id: Uuid,
    pub is_active: bool,
}

impl NewFunnelDomain {
    pub fn active(funnel_id: Uuid, domain_id: Uuid) -> Self {
        Self {
            funnel_id,
            domain_id,
            is_active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_attachment() {
        let funnel_id = Uuid::new_v4();
        let domain_id = Uuid::new_v4();
        let attachment = NewFunnelDomain::active(funnel_id, domain_id);
        assert_eq!(attachment.funnel_id, funnel_id);
        assert_eq!(attachment.domain_id, domain_id);
        assert!(attachment.is_active);
    }
}
