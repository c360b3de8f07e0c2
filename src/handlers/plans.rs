// Plan catalog and the authenticated user's entitlement endpoints

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::{Entitlement, Plan, PlanUsageSummary},
    services::entitlements::{
        calculate_ad_expiration_date, UserSubscriptionData, ValidationOutcome, ValidationResult,
    },
    utils::service_error::ServiceError,
};

// =============================================================================
// REQUEST / RESPONSE TYPES
// =============================================================================

/// Target plan, by slug or id
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({ "plan_id": "small_business" }))]
pub struct PlanChangeRequest {
    #[validate(length(min = 1, max = 100, message = "plan_id must not be empty"))]
    pub plan_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlanListResponse {
    pub success: bool,
    pub plans: Vec<Plan>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MyPlanResponse {
    pub success: bool,
    pub data: UserSubscriptionData,
    pub usage: PlanUsageSummary,
    /// Limits the validators enforce; the special-account entitlement for admins and test accounts
    pub effective_limits: Entitlement,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdExpirationResponse {
    pub success: bool,
    /// `null` when the plan has no ad duration limit
    pub expires_at: Option<DateTime<Utc>>,
    pub ad_duration_days: i32,
}

/// HTTP status for a validator decision
pub fn validation_status(result: &ValidationResult) -> StatusCode {
    match result.outcome {
        ValidationOutcome::Allowed => StatusCode::OK,
        ValidationOutcome::Denied => StatusCode::FORBIDDEN,
        ValidationOutcome::PlanNotFound => StatusCode::NOT_FOUND,
        ValidationOutcome::Unverifiable => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn validation_response(result: ValidationResult) -> Response {
    (validation_status(&result), Json(result)).into_response()
}

// =============================================================================
// HANDLERS
// =============================================================================

/// List the plans open for subscription
/// GET /api/v1/plans
#[utoipa::path(
    get,
    path = "/api/v1/plans",
    tag = "Plans",
    operation_id = "listPlans",
    responses(
        (status = 200, description = "Active plans ordered by monthly price", body = PlanListResponse),
        (status = 500, description = "Database error")
    )
)]
pub async fn list_plans(State(state): State<AppState>) -> Result<Json<PlanListResponse>, ServiceError> {
    let plans = state.entitlements.list_active_plans().await?;
    Ok(Json(PlanListResponse {
        success: true,
        plans,
    }))
}

/// Subscription, limits and usage of the current user
/// GET /api/v1/me/plan
#[utoipa::path(
    get,
    path = "/api/v1/me/plan",
    tag = "Plans",
    operation_id = "getMyPlan",
    responses(
        (status = 200, description = "Subscription and usage summary", body = MyPlanResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Could not verify plan limits")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
pub async fn get_my_plan(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<MyPlanResponse>, ServiceError> {
    let data = state
        .entitlements
        .get_user_subscription_data(auth_user.user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

    let usage = state
        .entitlements
        .get_user_plan_usage(auth_user.user_id)
        .await?;

    let effective_limits = if data.special.is_special {
        Entitlement::SPECIAL_ACCOUNT
    } else {
        usage.limits
    };

    Ok(Json(MyPlanResponse {
        success: true,
        data,
        usage,
        effective_limits,
    }))
}

/// May the current user create another ad?
/// GET /api/v1/me/plan/validation/ad
#[utoipa::path(
    get,
    path = "/api/v1/me/plan/validation/ad",
    tag = "Plans",
    operation_id = "validateAdCreation",
    responses(
        (status = 200, description = "Ad creation allowed", body = ValidationResult),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "Active ad limit reached", body = ValidationResult),
        (status = 500, description = "Could not verify plan limits", body = ValidationResult)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
pub async fn validate_ad(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Response {
    validation_response(state.entitlements.validate_ad_creation(auth_user.user_id).await)
}

/// May the current user create another highlight today?
/// GET /api/v1/me/plan/validation/highlight
#[utoipa::path(
    get,
    path = "/api/v1/me/plan/validation/highlight",
    tag = "Plans",
    operation_id = "validateHighlightCreation",
    responses(
        (status = 200, description = "Highlight creation allowed", body = ValidationResult),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "Plan has no highlights or the daily limit is reached", body = ValidationResult),
        (status = 500, description = "Could not verify plan limits", body = ValidationResult)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
pub async fn validate_highlight(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Response {
    validation_response(
        state
            .entitlements
            .validate_highlight_creation(auth_user.user_id)
            .await,
    )
}

/// Preview a plan change with warnings for usage above the new limits
/// POST /api/v1/me/plan/validation/change
#[utoipa::path(
    post,
    path = "/api/v1/me/plan/validation/change",
    tag = "Plans",
    operation_id = "validatePlanChange",
    request_body = PlanChangeRequest,
    responses(
        (status = 200, description = "Plan change possible, possibly with warnings", body = ValidationResult),
        (status = 400, description = "Bad request - validation failed"),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "Target plan not found", body = ValidationResult),
        (status = 500, description = "Could not verify plan limits", body = ValidationResult)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
pub async fn validate_plan_change(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(request): Json<PlanChangeRequest>,
) -> Response {
    if let Err(e) = request.validate() {
        return ServiceError::from(e).into_response();
    }

    validation_response(
        state
            .entitlements
            .validate_plan_change(auth_user.user_id, request.plan_id.trim())
            .await,
    )
}

/// Expiry a new ad would get under the current user's limits
/// GET /api/v1/me/plan/ad-expiration
#[utoipa::path(
    get,
    path = "/api/v1/me/plan/ad-expiration",
    tag = "Plans",
    operation_id = "getAdExpiration",
    responses(
        (status = 200, description = "Expiry for an ad created now", body = AdExpirationResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 500, description = "Could not verify plan limits")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
pub async fn get_ad_expiration(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<AdExpirationResponse>, ServiceError> {
    let limits = state
        .entitlements
        .effective_limits(auth_user.user_id)
        .await?;

    Ok(Json(AdExpirationResponse {
        success: true,
        expires_at: calculate_ad_expiration_date(&limits),
        ad_duration_days: limits.ad_duration_days,
    }))
}
