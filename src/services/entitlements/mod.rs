// Plan entitlement and usage validation
// Decides whether a user may create an ad, create a highlight or change plan,
// based on the active subscription's plan and current usage.

pub mod rules;
pub mod types;

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::app_config::PlansConfig;
use crate::models::{CurrentUsage, Entitlement, NewSubscription, Plan, PlanUsageSummary, UsagePercentage, UserSummary};
use crate::services::plan_store::{PlanStore, StoreError};
use crate::services::special_users::{SpecialUserClassifier, SpecialUserRecord};

pub use rules::{calculate_ad_expiration_date, utc_day_bounds};
pub use types::{
    CountUnavailable, Denial, PlanChangeError, PlanChangeOutcome, PlanChangeReport,
    ResolutionError, SubscriptionWithPlan, UserSubscriptionData, ValidationOutcome,
    ValidationResult,
};

// =============================================================================
// SETTINGS
// =============================================================================

#[derive(Debug, Clone)]
pub struct EntitlementSettings {
    pub free_plan_slug: String,
    pub paid_subscription_days: i64,
}

impl Default for EntitlementSettings {
    fn default() -> Self {
        Self {
            free_plan_slug: "free".to_string(),
            paid_subscription_days: 30,
        }
    }
}

impl From<&PlansConfig> for EntitlementSettings {
    fn from(config: &PlansConfig) -> Self {
        Self {
            free_plan_slug: config.free_plan_slug.clone(),
            paid_subscription_days: config.paid_subscription_days,
        }
    }
}

/// Actions that consume a plan quota
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GatedAction {
    AdCreation,
    HighlightCreation,
}

impl GatedAction {
    fn quota_name(&self) -> &'static str {
        match self {
            GatedAction::AdCreation => "ads",
            GatedAction::HighlightCreation => "highlights",
        }
    }

    fn check(&self, limits: &Entitlement, usage: &CurrentUsage) -> Result<(), Denial> {
        match self {
            GatedAction::AdCreation => rules::check_ad_quota(limits, usage.active_ads),
            GatedAction::HighlightCreation => {
                rules::check_highlight_quota(limits, usage.highlights_today)
            },
        }
    }
}

// =============================================================================
// ENTITLEMENT SERVICE
// =============================================================================

pub struct EntitlementService {
    store: Arc<dyn PlanStore>,
    classifier: SpecialUserClassifier,
    settings: EntitlementSettings,
}

impl EntitlementService {
    pub fn new(
        store: Arc<dyn PlanStore>,
        classifier: SpecialUserClassifier,
        settings: EntitlementSettings,
    ) -> Self {
        Self {
            store,
            classifier,
            settings,
        }
    }

    pub fn classifier(&self) -> &SpecialUserClassifier {
        &self.classifier
    }

    pub async fn is_special_user(&self, user_id: Uuid) -> SpecialUserRecord {
        self.classifier.classify(self.store.as_ref(), user_id).await
    }

    /// Entitlement of the active subscription's plan, else the free plan.
    /// Does not apply the special-account override.
    #[instrument(skip(self))]
    pub async fn get_user_plan_limits(&self, user_id: Uuid) -> Result<Entitlement, ResolutionError> {
        match self.store.find_active_subscription(user_id).await {
            Ok(Some((_, plan))) => return Ok(plan.entitlement()),
            Ok(None) => {},
            Err(e) => {
                // An unreadable subscription falls back to the free plan like a missing one
                warn!(
                    "[PLANS] Active subscription lookup failed for {}, using '{}': {}",
                    user_id, self.settings.free_plan_slug, e
                );
            },
        }

        self.store
            .find_plan_by_slug(&self.settings.free_plan_slug)
            .await?
            .map(|plan| plan.entitlement())
            .ok_or_else(|| ResolutionError::FreePlanMissing(self.settings.free_plan_slug.clone()))
    }

    /// Special accounts get `Entitlement::SPECIAL_ACCOUNT`, everyone else their plan's
    pub async fn effective_limits(&self, user_id: Uuid) -> Result<Entitlement, ResolutionError> {
        if self.is_special_user(user_id).await.is_special {
            return Ok(Entitlement::SPECIAL_ACCOUNT);
        }
        self.get_user_plan_limits(user_id).await
    }

    pub async fn active_ads_count(&self, user_id: Uuid) -> Result<i64, CountUnavailable> {
        Ok(self.store.count_active_ads(user_id, Utc::now()).await?)
    }

    pub async fn highlights_today_count(&self, user_id: Uuid) -> Result<i64, CountUnavailable> {
        let (start, end) = utc_day_bounds(Utc::now());
        Ok(self.store.count_highlights_between(user_id, start, end).await?)
    }

    /// Active ad count, `0` when it cannot be read
    pub async fn get_user_active_ads_count(&self, user_id: Uuid) -> i64 {
        self.active_ads_count(user_id).await.unwrap_or_else(|e| {
            warn!("[PLANS] Counting active ads for {} failed, using 0: {}", user_id, e);
            0
        })
    }

    /// Highlights created today (UTC), `0` when it cannot be read
    pub async fn get_user_highlights_today(&self, user_id: Uuid) -> i64 {
        self.highlights_today_count(user_id).await.unwrap_or_else(|e| {
            warn!("[PLANS] Counting today's highlights for {} failed, using 0: {}", user_id, e);
            0
        })
    }

    pub async fn current_usage(&self, user_id: Uuid) -> CurrentUsage {
        let (active_ads, highlights_today) = tokio::join!(
            self.get_user_active_ads_count(user_id),
            self.get_user_highlights_today(user_id)
        );
        CurrentUsage {
            active_ads,
            highlights_today,
        }
    }

    #[instrument(skip(self))]
    pub async fn validate_ad_creation(&self, user_id: Uuid) -> ValidationResult {
        self.gated(user_id, GatedAction::AdCreation).await
    }

    #[instrument(skip(self))]
    pub async fn validate_highlight_creation(&self, user_id: Uuid) -> ValidationResult {
        self.gated(user_id, GatedAction::HighlightCreation).await
    }

    /// Special-account bypass, then resolve limits, count and apply the rule
    async fn gated(&self, user_id: Uuid, action: GatedAction) -> ValidationResult {
        let special = self.is_special_user(user_id).await;
        if special.is_special {
            info!(
                "[PLANS] Special account {} (admin: {}, test: {}) bypasses {} quota",
                special.email.as_deref().unwrap_or("-"),
                special.is_admin,
                special.is_test,
                action.quota_name()
            );
            let kind = if special.is_test { "Test" } else { "Administrator" };
            return ValidationResult::allowed(
                Entitlement::SPECIAL_ACCOUNT,
                self.current_usage(user_id).await,
            )
            .with_message(format!("{} account with unlimited {}", kind, action.quota_name()));
        }

        let limits = match self.get_user_plan_limits(user_id).await {
            Ok(limits) => limits,
            Err(e) => {
                error!("[PLANS] Could not resolve plan limits for {}: {}", user_id, e);
                return ValidationResult::unverifiable();
            },
        };

        let usage = self.current_usage(user_id).await;

        match action.check(&limits, &usage) {
            Ok(()) => ValidationResult::allowed(limits, usage),
            Err(denial) => {
                info!("[PLANS] Denied {} for {}: {:?}", action.quota_name(), user_id, denial);
                ValidationResult::denied(&denial, limits, usage)
            },
        }
    }

    /// Look a plan up by slug, then by primary key
    pub async fn find_plan(&self, identifier: &str) -> Result<Option<Plan>, StoreError> {
        if let Some(plan) = self.store.find_plan_by_slug(identifier).await? {
            return Ok(Some(plan));
        }
        match Uuid::parse_str(identifier) {
            Ok(plan_id) => self.store.find_plan_by_id(plan_id).await,
            Err(_) => Ok(None),
        }
    }

    /// Approve a move to `plan_identifier`, with warnings where usage exceeds the new limits.
    /// Only an unknown target is refused.
    #[instrument(skip(self))]
    pub async fn validate_plan_change(&self, user_id: Uuid, plan_identifier: &str) -> ValidationResult {
        match self.find_plan(plan_identifier).await {
            Ok(Some(plan)) => self.validate_plan_change_to(user_id, &plan).await,
            Ok(None) => ValidationResult::plan_not_found(),
            Err(e) => {
                error!("[PLANS] Target plan lookup failed for '{}': {}", plan_identifier, e);
                ValidationResult::unverifiable()
            },
        }
    }

    async fn validate_plan_change_to(&self, user_id: Uuid, target: &Plan) -> ValidationResult {
        let target_limits = target.entitlement();
        let usage = self.current_usage(user_id).await;

        let current = match self.store.find_active_subscription(user_id).await {
            Ok(current) => current,
            Err(e) => {
                warn!(
                    "[PLANS] Active subscription lookup failed for {}, treating as none: {}",
                    user_id, e
                );
                None
            },
        };

        let Some((_, current_plan)) = current else {
            return ValidationResult::allowed(target_limits, usage).with_message(format!(
                "User without an active subscription can move to the {} plan",
                target.name
            ));
        };

        let warnings = rules::plan_change_warnings(&current_plan.entitlement(), &target_limits, &usage);
        let message = if warnings.is_empty() {
            format!("Plan change approved: {} → {}", current_plan.name, target.name)
        } else {
            format!("Plan change possible with warnings: {}", warnings.join(" "))
        };

        ValidationResult::allowed(target_limits, usage)
            .with_message(message)
            .with_warnings(warnings)
    }

    /// Recompute usage against the new plan and record it on the user row (best effort)
    #[instrument(skip(self))]
    pub async fn apply_new_plan_limits(&self, user_id: Uuid, plan_id: Uuid) -> PlanChangeOutcome {
        match self.store.find_plan_by_id(plan_id).await {
            Ok(Some(plan)) => self.apply_plan_limits(user_id, &plan).await,
            Ok(None) => PlanChangeOutcome {
                success: false,
                message: "New plan not found".to_string(),
                applied_changes: Vec::new(),
            },
            Err(e) => {
                error!("[PLANS] Loading plan {} failed: {}", plan_id, e);
                PlanChangeOutcome {
                    success: false,
                    message: "Could not load the new plan".to_string(),
                    applied_changes: Vec::new(),
                }
            },
        }
    }

    async fn apply_plan_limits(&self, user_id: Uuid, plan: &Plan) -> PlanChangeOutcome {
        let usage = self.current_usage(user_id).await;

        let user_updated = match self.store.set_user_subscription_plan(user_id, &plan.slug).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "[PLANS] Could not record plan '{}' on user {}: {}",
                    plan.slug, user_id, e
                );
                false
            },
        };

        PlanChangeOutcome {
            success: true,
            message: format!("{} plan limits applied", plan.name),
            applied_changes: rules::applied_change_notices(plan, &usage, user_updated),
        }
    }

    /// Admin flow: validate, replace the subscription in one transaction, apply limits
    #[instrument(skip(self))]
    pub async fn change_user_plan(
        &self,
        user_id: Uuid,
        plan_identifier: &str,
    ) -> Result<PlanChangeReport, PlanChangeError> {
        if self.store.find_user(user_id).await?.is_none() {
            return Err(PlanChangeError::UserNotFound);
        }

        let plan = self
            .find_plan(plan_identifier)
            .await?
            .ok_or(PlanChangeError::TargetPlanNotFound)?;

        if !plan.is_active {
            return Err(PlanChangeError::InactivePlan(plan.slug));
        }

        let validation = self.validate_plan_change_to(user_id, &plan).await;

        let is_free_plan = plan.is_free() || plan.slug == self.settings.free_plan_slug;
        let new_subscription = NewSubscription::granted_by_admin(
            user_id,
            plan.id,
            is_free_plan,
            Utc::now(),
            self.settings.paid_subscription_days,
        );

        let subscription = self.store.replace_active_subscription(new_subscription).await?;
        info!(
            "[PLANS] User {} moved to plan '{}' (subscription {})",
            user_id, plan.slug, subscription.id
        );

        let applied = self.apply_plan_limits(user_id, &plan).await;

        Ok(PlanChangeReport {
            subscription,
            plan,
            validation,
            applied,
        })
    }

    /// Limits, usage and usage percentages of the resolved plan
    pub async fn get_user_plan_usage(&self, user_id: Uuid) -> Result<PlanUsageSummary, ResolutionError> {
        let limits = self.get_user_plan_limits(user_id).await?;
        let current_usage = self.current_usage(user_id).await;

        Ok(PlanUsageSummary {
            usage_percentage: UsagePercentage::compute(&limits, &current_usage),
            limits,
            current_usage,
        })
    }

    /// User basics with the active subscription, `None` for unknown users
    pub async fn get_user_subscription_data(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserSubscriptionData>, StoreError> {
        let Some(user) = self.store.find_user(user_id).await? else {
            return Ok(None);
        };

        let subscription = match self.store.find_active_subscription(user_id).await {
            Ok(found) => found.map(|(subscription, plan)| SubscriptionWithPlan { subscription, plan }),
            Err(e) => {
                warn!(
                    "[PLANS] Active subscription lookup failed for {}, reporting none: {}",
                    user_id, e
                );
                None
            },
        };

        let special = user
            .normalized_email()
            .map(|email| self.classifier.classify_email(&email))
            .unwrap_or_default();

        Ok(Some(UserSubscriptionData {
            user: UserSummary::from(user),
            has_active_subscription: subscription.is_some(),
            subscription,
            special,
        }))
    }

    pub async fn list_active_plans(&self) -> Result<Vec<Plan>, StoreError> {
        self.store.list_active_plans().await
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        self.store.health_check().await
    }
}
