// Result and error types returned by the entitlement service

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::{CurrentUsage, Entitlement, Plan, Subscription, UserSummary};
use crate::services::plan_store::StoreError;
use crate::services::special_users::SpecialUserRecord;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// The user's entitlement could not be determined
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("Fallback plan '{0}' not found")]
    FreePlanMissing(String),

    #[error("Store error while resolving plan: {0}")]
    Store(#[from] StoreError),
}

/// A usage counter could not be read
#[derive(Error, Debug)]
#[error("Usage count unavailable: {0}")]
pub struct CountUnavailable(#[from] pub StoreError);

#[derive(Error, Debug)]
pub enum PlanChangeError {
    #[error("Target plan not found")]
    TargetPlanNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Plan '{0}' is not available for new subscriptions")]
    InactivePlan(String),

    #[error("Failed to change plan: {0}")]
    Store(#[from] StoreError),
}

/// Why a gated action was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    #[error("You have reached the limit of {limit} active ads for your plan ({active} active). Delete an ad or wait for one to expire before creating a new one.")]
    AdLimitReached { limit: i32, active: i64 },

    #[error("Your plan does not allow highlights. Upgrade to a higher plan to create them.")]
    HighlightsNotAllowed,

    #[error("You have reached the limit of {limit} highlights per day for your plan. Try again tomorrow.")]
    HighlightLimitReached { limit: i32, today: i64 },
}

// =============================================================================
// VALIDATION RESULT
// =============================================================================

pub const UNVERIFIABLE_MESSAGE: &str = "Could not verify plan limits";
pub const PLAN_NOT_FOUND_MESSAGE: &str = "Target plan not found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Allowed,
    Denied,
    PlanNotFound,
    Unverifiable,
}

/// Decision returned by every validator
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "success": false,
    "message": "You have reached the limit of 5 active ads for your plan (5 active). Delete an ad or wait for one to expire before creating a new one.",
    "limits": {
        "max_active_ads": 5,
        "max_highlights_per_day": 2,
        "ad_duration_days": 90,
        "max_photos_per_ad": 10,
        "has_premium_features": true,
        "statistics_level": "advanced",
        "support_type": "priority",
        "has_search_highlight": false
    },
    "current_usage": { "active_ads": 5, "highlights_today": 0 }
}))]
pub struct ValidationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<Entitlement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_usage: Option<CurrentUsage>,
    #[serde(skip)]
    pub outcome: ValidationOutcome,
}

impl ValidationResult {
    pub fn allowed(limits: Entitlement, usage: CurrentUsage) -> Self {
        Self {
            success: true,
            message: None,
            warnings: Vec::new(),
            limits: Some(limits),
            current_usage: Some(usage),
            outcome: ValidationOutcome::Allowed,
        }
    }

    pub fn denied(denial: &Denial, limits: Entitlement, usage: CurrentUsage) -> Self {
        Self {
            success: false,
            message: Some(denial.to_string()),
            warnings: Vec::new(),
            limits: Some(limits),
            current_usage: Some(usage),
            outcome: ValidationOutcome::Denied,
        }
    }

    pub fn unverifiable() -> Self {
        Self::failure(UNVERIFIABLE_MESSAGE, ValidationOutcome::Unverifiable)
    }

    pub fn plan_not_found() -> Self {
        Self::failure(PLAN_NOT_FOUND_MESSAGE, ValidationOutcome::PlanNotFound)
    }

    fn failure(message: &str, outcome: ValidationOutcome) -> Self {
        Self {
            success: false,
            message: Some(message.to_string()),
            warnings: Vec::new(),
            limits: None,
            current_usage: None,
            outcome,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

// =============================================================================
// PLAN CHANGE
// =============================================================================

/// Notices produced after a plan change
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlanChangeOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub applied_changes: Vec<String>,
}

/// Everything an admin plan change produced
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlanChangeReport {
    pub subscription: Subscription,
    pub plan: Plan,
    pub validation: ValidationResult,
    pub applied: PlanChangeOutcome,
}

// =============================================================================
// SUBSCRIPTION DATA
// =============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionWithPlan {
    pub subscription: Subscription,
    pub plan: Plan,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserSubscriptionData {
    pub user: UserSummary,
    pub subscription: Option<SubscriptionWithPlan>,
    pub has_active_subscription: bool,
    pub special: SpecialUserRecord,
}
