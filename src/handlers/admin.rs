// Administrator subscription management

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::{headers::UserAgent, TypedHeader};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    handlers::plans::PlanChangeRequest,
    middleware::auth::AuthenticatedUser,
    models::Plan,
    services::entitlements::{PlanChangeReport, UserSubscriptionData},
    utils::service_error::ServiceError,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminSubscriptionResponse {
    pub success: bool,
    pub data: UserSubscriptionData,
    pub available_plans: Vec<Plan>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminPlanChangeResponse {
    pub success: bool,
    pub message: String,
    pub report: PlanChangeReport,
}

/// Subscription of any user, with the plans it can be moved to
/// GET /api/v1/admin/users/{id}/subscription
#[utoipa::path(
    get,
    path = "/api/v1/admin/users/{id}/subscription",
    tag = "Admin",
    operation_id = "adminGetUserSubscription",
    params(
        ("id" = Uuid, Path, description = "User ID (UUID)", example = "123e4567-e89b-12d3-a456-426614174000")
    ),
    responses(
        (status = 200, description = "User subscription data", body = AdminSubscriptionResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "Administrator access required"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
pub async fn get_user_subscription(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<AdminSubscriptionResponse>, ServiceError> {
    let data = state
        .entitlements
        .get_user_subscription_data(user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

    let available_plans = state.entitlements.list_active_plans().await?;

    Ok(Json(AdminSubscriptionResponse {
        success: true,
        data,
        available_plans,
    }))
}

/// Move a user to another plan
/// PUT /api/v1/admin/users/{id}/subscription
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/subscription",
    tag = "Admin",
    operation_id = "adminChangeUserPlan",
    params(
        ("id" = Uuid, Path, description = "User ID (UUID)", example = "123e4567-e89b-12d3-a456-426614174000")
    ),
    request_body = PlanChangeRequest,
    responses(
        (status = 200, description = "Plan changed", body = AdminPlanChangeResponse),
        (status = 400, description = "Bad request - validation failed"),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "Administrator access required"),
        (status = 404, description = "User or plan not found"),
        (status = 409, description = "Plan is not available for new subscriptions"),
        (status = 500, description = "Database error")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
pub async fn change_user_plan(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedUser>,
    user_agent: Option<TypedHeader<UserAgent>>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<PlanChangeRequest>,
) -> Result<Json<AdminPlanChangeResponse>, ServiceError> {
    request.validate()?;

    let user_agent = user_agent.map(|TypedHeader(ua)| ua.to_string());
    info!(
        "[PLANS] Admin {} (token {}) changing plan of {} to '{}' (user agent: {})",
        admin.user_id,
        admin.token_id,
        user_id,
        request.plan_id,
        user_agent.as_deref().unwrap_or("unknown")
    );

    let report = state
        .entitlements
        .change_user_plan(user_id, request.plan_id.trim())
        .await?;

    let message = report
        .validation
        .message
        .clone()
        .unwrap_or_else(|| format!("Plan changed to {}", report.plan.name));

    Ok(Json(AdminPlanChangeResponse {
        success: true,
        message,
        report,
    }))
}
