// Ad and highlight rows, as far as plan accounting needs them

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::schema::{ads, highlights};

/// Ad moderation/lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdStatus {
    Pending,
    Approved,
    Active,
    Rejected,
    Expired,
}

impl AdStatus {
    /// Statuses that occupy a slot of the plan's active-ad quota
    pub const COUNTED: [AdStatus; 2] = [AdStatus::Pending, AdStatus::Approved];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdStatus::Pending => "pending",
            AdStatus::Approved => "approved",
            AdStatus::Active => "active",
            AdStatus::Rejected => "rejected",
            AdStatus::Expired => "expired",
        }
    }

    pub fn counted_strs() -> [&'static str; 2] {
        [Self::COUNTED[0].as_str(), Self::COUNTED[1].as_str()]
    }
}

impl FromStr for AdStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AdStatus::Pending),
            "approved" => Ok(AdStatus::Approved),
            "active" => Ok(AdStatus::Active),
            "rejected" => Ok(AdStatus::Rejected),
            "expired" => Ok(AdStatus::Expired),
            _ => Err(format!("Invalid ad status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = ads)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Ad {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub status: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ad {
    /// Whether this ad takes up quota at `now`
    pub fn counts_toward_quota(&self, now: DateTime<Utc>) -> bool {
        let counted_status = AdStatus::from_str(&self.status)
            .map(|s| AdStatus::COUNTED.contains(&s))
            .unwrap_or(false);
        counted_status && self.expires_at.map_or(true, |expires| expires > now)
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = highlights)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Highlight {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ad_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ad(status: &str, expires_at: Option<DateTime<Utc>>) -> Ad {
        let now = Utc::now();
        Ad {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Bicicleta aro 29".to_string(),
            status: status.to_string(),
            expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_counted_statuses() {
        assert_eq!(AdStatus::counted_strs(), ["pending", "approved"]);
    }

    #[test]
    fn test_counts_toward_quota() {
        let now = Utc::now();
        let hour = chrono::Duration::hours(1);

        assert!(ad("pending", None).counts_toward_quota(now));
        assert!(ad("approved", Some(now + hour)).counts_toward_quota(now));
        assert!(!ad("approved", Some(now - hour)).counts_toward_quota(now));
        assert!(!ad("approved", Some(now)).counts_toward_quota(now));
        assert!(!ad("active", None).counts_toward_quota(now));
        assert!(!ad("rejected", None).counts_toward_quota(now));
        assert!(!ad("garbage", None).counts_toward_quota(now));
    }
}
