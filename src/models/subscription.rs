// Subscription model: links a user to a plan over a period

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::schema::subscriptions;

/// Payment method recorded for admin-granted free plans
pub const PAYMENT_METHOD_FREE: &str = "Free";
/// Payment method recorded for admin-granted paid plans
pub const PAYMENT_METHOD_MANUAL_ADMIN: &str = "Manual (Admin)";

/// Subscription lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            "expired" => Ok(SubscriptionStatus::Expired),
            _ => Err(format!("Invalid subscription status: {}", s)),
        }
    }
}

/// Subscription database model
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize, ToSchema)]
#[diesel(table_name = subscriptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub status: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Status as enum; unknown values are treated as expired so they never grant limits
    pub fn status_enum(&self) -> SubscriptionStatus {
        SubscriptionStatus::from_str(&self.status).unwrap_or_else(|e| {
            tracing::warn!(
                "Invalid subscription status '{}' on subscription {}, treating as expired: {}",
                self.status,
                self.id,
                e
            );
            SubscriptionStatus::Expired
        })
    }

    pub fn is_active(&self) -> bool {
        self.status_enum() == SubscriptionStatus::Active
    }
}

/// New subscription for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subscriptions)]
pub struct NewSubscription {
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub status: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
}

impl NewSubscription {
    /// Active subscription starting at `starts_at`; paid plans run for `paid_days`, free ones never end
    pub fn granted_by_admin(
        user_id: Uuid,
        plan_id: Uuid,
        is_free_plan: bool,
        starts_at: DateTime<Utc>,
        paid_days: i64,
    ) -> Self {
        let (ends_at, payment_method) = if is_free_plan {
            (None, PAYMENT_METHOD_FREE)
        } else {
            (
                starts_at.checked_add_signed(chrono::Duration::days(paid_days)),
                PAYMENT_METHOD_MANUAL_ADMIN,
            )
        };

        Self {
            user_id,
            plan_id,
            status: SubscriptionStatus::Active.as_str().to_string(),
            starts_at,
            ends_at,
            payment_method: Some(payment_method.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_conversion() {
        assert_eq!(SubscriptionStatus::Active.as_str(), "active");
        assert_eq!(
            SubscriptionStatus::from_str("cancelled"),
            Ok(SubscriptionStatus::Cancelled)
        );
        assert!(SubscriptionStatus::from_str("paused").is_err());
    }

    #[test]
    fn test_admin_grant_for_paid_plan_ends_after_paid_days() {
        let now = Utc::now();
        let sub = NewSubscription::granted_by_admin(Uuid::new_v4(), Uuid::new_v4(), false, now, 30);

        assert_eq!(sub.status, "active");
        assert_eq!(sub.ends_at, Some(now + chrono::Duration::days(30)));
        assert_eq!(sub.payment_method.as_deref(), Some(PAYMENT_METHOD_MANUAL_ADMIN));
    }

    #[test]
    fn test_admin_grant_for_free_plan_never_ends() {
        let now = Utc::now();
        let sub = NewSubscription::granted_by_admin(Uuid::new_v4(), Uuid::new_v4(), true, now, 30);

        assert!(sub.ends_at.is_none());
        assert_eq!(sub.payment_method.as_deref(), Some(PAYMENT_METHOD_FREE));
    }
}
