// In-memory plan store for tests, fixtures and local development

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PlanStore, StoreError};
use crate::models::{
    Ad, AdStatus, Highlight, NewSubscription, Plan, Subscription, SubscriptionStatus, User,
    UNLIMITED_AD_DURATION,
};

/// Operations that can be made to fail on purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    UserLookup,
    SubscriptionLookup,
    PlanLookup,
    AdCount,
    HighlightCount,
    SubscriptionWrite,
    UserUpdate,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    plans: Vec<Plan>,
    subscriptions: Vec<Subscription>,
    ads: Vec<Ad>,
    highlights: Vec<Highlight>,
}

#[derive(Default)]
pub struct InMemoryPlanStore {
    state: RwLock<MemoryState>,
    failures: RwLock<HashSet<FailurePoint>>,
}

/// The marketplace's standard catalog, the same rows the seed migration inserts
pub fn marketplace_catalog() -> Vec<Plan> {
    let now = Utc::now();
    let plan = |name: &str,
                slug: &str,
                monthly: i32,
                max_ads: i32,
                highlights: i32,
                duration: i32,
                photos: i32,
                premium: bool,
                search_highlight: bool| Plan {
        id: Uuid::new_v4(),
        name: name.to_string(),
        slug: slug.to_string(),
        description: None,
        price_monthly_cents: monthly,
        price_yearly_cents: monthly * 10,
        max_ads,
        max_highlights_per_day: highlights,
        ad_duration_days: duration,
        max_photos_per_ad: photos,
        has_premium_features: premium,
        statistics_level: Some(if premium { "advanced" } else { "basic" }.to_string()),
        support_type: Some(if premium { "priority" } else { "email" }.to_string()),
        has_search_highlight: Some(search_highlight),
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    vec![
        plan("Gratuito", "free", 0, 1, 0, 30, 5, false, false),
        plan("Microempresa", "micro_business", 2490, 2, 1, 60, 8, false, false),
        plan("Pequena Empresa", "small_business", 4990, 5, 2, 90, 10, true, false),
        plan("Empresa", "business_simple", 9990, 10, 4, 120, 15, true, true),
        plan("Empresa Plus", "business_plus", 14990, 20, 8, UNLIMITED_AD_DURATION, 20, true, true),
    ]
}

impl InMemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with `marketplace_catalog()`
    pub fn with_marketplace_plans() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                plans: marketplace_catalog(),
                ..MemoryState::default()
            }),
            failures: RwLock::default(),
        }
    }

    pub async fn fail(&self, point: FailurePoint) {
        self.failures.write().await.insert(point);
    }

    pub async fn recover(&self, point: FailurePoint) {
        self.failures.write().await.remove(&point);
    }

    async fn check(&self, point: FailurePoint) -> Result<(), StoreError> {
        if self.failures.read().await.contains(&point) {
            return Err(StoreError::Unavailable(format!("{:?} failure injected", point)));
        }
        Ok(())
    }

    pub async fn add_user(&self, email: Option<&str>) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.map(str::to_string),
            name: None,
            user_type: "personal".to_string(),
            subscription_plan: None,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.users.insert(user.id, user.clone());
        user
    }

    pub async fn user(&self, user_id: Uuid) -> Option<User> {
        self.state.read().await.users.get(&user_id).cloned()
    }

    pub async fn add_plan(&self, plan: Plan) -> Plan {
        let mut state = self.state.write().await;
        state.plans.retain(|p| p.slug != plan.slug);
        state.plans.push(plan.clone());
        plan
    }

    pub async fn remove_plan(&self, slug: &str) {
        self.state.write().await.plans.retain(|p| p.slug != slug);
    }

    pub async fn plan(&self, slug: &str) -> Option<Plan> {
        self.state
            .read()
            .await
            .plans
            .iter()
            .find(|p| p.slug == slug)
            .cloned()
    }

    pub async fn add_subscription(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        status: SubscriptionStatus,
        starts_at: DateTime<Utc>,
    ) -> Subscription {
        let subscription = Subscription {
            id: Uuid::new_v4(),
            user_id,
            plan_id,
            status: status.as_str().to_string(),
            starts_at,
            ends_at: None,
            cancelled_at: None,
            payment_method: None,
            created_at: starts_at,
            updated_at: starts_at,
        };
        self.state
            .write()
            .await
            .subscriptions
            .push(subscription.clone());
        subscription
    }

    pub async fn subscriptions_for(&self, user_id: Uuid) -> Vec<Subscription> {
        self.state
            .read()
            .await
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn add_ads(
        &self,
        user_id: Uuid,
        count: usize,
        status: AdStatus,
        expires_at: Option<DateTime<Utc>>,
    ) {
        let now = Utc::now();
        let mut state = self.state.write().await;
        for n in 0..count {
            state.ads.push(Ad {
                id: Uuid::new_v4(),
                user_id,
                title: format!("Anúncio {}", n + 1),
                status: status.as_str().to_string(),
                expires_at,
                created_at: now,
                updated_at: now,
            });
        }
    }

    pub async fn add_highlight(&self, user_id: Uuid, created_at: DateTime<Utc>) {
        self.state.write().await.highlights.push(Highlight {
            id: Uuid::new_v4(),
            user_id,
            ad_id: None,
            created_at,
        });
    }
}

#[async_trait]
impl PlanStore for InMemoryPlanStore {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        self.check(FailurePoint::UserLookup).await?;
        Ok(self.user(user_id).await)
    }

    async fn find_active_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<(Subscription, Plan)>, StoreError> {
        self.check(FailurePoint::SubscriptionLookup).await?;
        let state = self.state.read().await;

        let found = state
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id && s.is_active())
            .max_by_key(|s| s.starts_at)
            .and_then(|s| {
                state
                    .plans
                    .iter()
                    .find(|p| p.id == s.plan_id)
                    .map(|p| (s.clone(), p.clone()))
            });

        Ok(found)
    }

    async fn find_plan_by_slug(&self, slug: &str) -> Result<Option<Plan>, StoreError> {
        self.check(FailurePoint::PlanLookup).await?;
        Ok(self.plan(slug).await)
    }

    async fn find_plan_by_id(&self, plan_id: Uuid) -> Result<Option<Plan>, StoreError> {
        self.check(FailurePoint::PlanLookup).await?;
        Ok(self
            .state
            .read()
            .await
            .plans
            .iter()
            .find(|p| p.id == plan_id)
            .cloned())
    }

    async fn list_active_plans(&self) -> Result<Vec<Plan>, StoreError> {
        self.check(FailurePoint::PlanLookup).await?;
        let mut plans: Vec<Plan> = self
            .state
            .read()
            .await
            .plans
            .iter()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        plans.sort_by(|a, b| {
            a.price_monthly_cents
                .cmp(&b.price_monthly_cents)
                .then_with(|| a.slug.cmp(&b.slug))
        });
        Ok(plans)
    }

    async fn count_active_ads(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<i64, StoreError> {
        self.check(FailurePoint::AdCount).await?;
        let count = self
            .state
            .read()
            .await
            .ads
            .iter()
            .filter(|ad| ad.user_id == user_id && ad.counts_toward_quota(now))
            .count();
        Ok(count as i64)
    }

    async fn count_highlights_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        self.check(FailurePoint::HighlightCount).await?;
        let count = self
            .state
            .read()
            .await
            .highlights
            .iter()
            .filter(|h| h.user_id == user_id && h.created_at >= from && h.created_at <= to)
            .count();
        Ok(count as i64)
    }

    async fn replace_active_subscription(
        &self,
        new_subscription: NewSubscription,
    ) -> Result<Subscription, StoreError> {
        self.check(FailurePoint::SubscriptionWrite).await?;
        let now = Utc::now();
        let mut state = self.state.write().await;

        for existing in state
            .subscriptions
            .iter_mut()
            .filter(|s| s.user_id == new_subscription.user_id && s.is_active())
        {
            existing.status = SubscriptionStatus::Cancelled.as_str().to_string();
            existing.cancelled_at = Some(now);
            existing.updated_at = now;
        }

        let subscription = Subscription {
            id: Uuid::new_v4(),
            user_id: new_subscription.user_id,
            plan_id: new_subscription.plan_id,
            status: new_subscription.status,
            starts_at: new_subscription.starts_at,
            ends_at: new_subscription.ends_at,
            cancelled_at: None,
            payment_method: new_subscription.payment_method,
            created_at: now,
            updated_at: now,
        };
        state.subscriptions.push(subscription.clone());

        Ok(subscription)
    }

    async fn set_user_subscription_plan(&self, user_id: Uuid, plan_slug: &str) -> Result<(), StoreError> {
        self.check(FailurePoint::UserUpdate).await?;
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::NotFound("User"))?;
        user.subscription_plan = Some(plan_slug.to_string());
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.check(FailurePoint::UserLookup).await
    }
}
