// Storage boundary for plan entitlement checks
// Everything the entitlement core reads or writes goes through `PlanStore`.

pub mod diesel;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewSubscription, Plan, Subscription, User};

pub use self::diesel::DieselPlanStore;
pub use memory::{FailurePoint, InMemoryPlanStore};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Database error: {0}")]
    Database(#[from] ::diesel::result::Error),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;

    /// Most recent active subscription joined with its plan
    async fn find_active_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<(Subscription, Plan)>, StoreError>;

    async fn find_plan_by_slug(&self, slug: &str) -> Result<Option<Plan>, StoreError>;

    async fn find_plan_by_id(&self, plan_id: Uuid) -> Result<Option<Plan>, StoreError>;

    /// Active plans, cheapest first
    async fn list_active_plans(&self) -> Result<Vec<Plan>, StoreError>;

    /// Pending or approved ads that have not expired at `now`
    async fn count_active_ads(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<i64, StoreError>;

    /// Highlights with `from <= created_at <= to`
    async fn count_highlights_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, StoreError>;

    /// Cancel the user's active subscription and insert `new_subscription`, atomically
    async fn replace_active_subscription(
        &self,
        new_subscription: NewSubscription,
    ) -> Result<Subscription, StoreError>;

    /// Update the denormalized plan slug on the user row
    async fn set_user_subscription_plan(&self, user_id: Uuid, plan_slug: &str) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
