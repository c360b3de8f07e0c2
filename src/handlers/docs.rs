// OpenAPI document served at /api/v1/docs/openapi.json

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::handlers::{admin, plans};
use crate::models::{
    CurrentUsage, Entitlement, Plan, PlanUsageSummary, StatisticsLevel, Subscription,
    SubscriptionStatus, SupportType, UsagePercentage, UserSummary,
};
use crate::services::entitlements::{
    PlanChangeOutcome, PlanChangeReport, SubscriptionWithPlan, UserSubscriptionData,
    ValidationResult,
};
use crate::services::special_users::SpecialUserRecord;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Classifieds Plans API",
        description = "Plan entitlements, usage limits and subscription management for the classifieds marketplace",
        version = "1.0.0"
    ),
    paths(
        crate::health_check,
        plans::list_plans,
        plans::get_my_plan,
        plans::validate_ad,
        plans::validate_highlight,
        plans::validate_plan_change,
        plans::get_ad_expiration,
        admin::get_user_subscription,
        admin::change_user_plan,
    ),
    components(
        schemas(
            Plan,
            Entitlement,
            StatisticsLevel,
            SupportType,
            Subscription,
            SubscriptionStatus,
            CurrentUsage,
            UsagePercentage,
            PlanUsageSummary,
            UserSummary,
            SpecialUserRecord,
            SubscriptionWithPlan,
            UserSubscriptionData,
            ValidationResult,
            PlanChangeOutcome,
            PlanChangeReport,
            plans::PlanChangeRequest,
            plans::PlanListResponse,
            plans::MyPlanResponse,
            plans::AdExpirationResponse,
            admin::AdminSubscriptionResponse,
            admin::AdminPlanChangeResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Plans", description = "Plan catalog and entitlement checks"),
        (name = "Admin", description = "Subscription management for administrators"),
        (name = "Health", description = "Service health checks")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Serve the OpenAPI JSON document
pub async fn serve_openapi_spec() -> Response {
    match ApiDoc::openapi().to_json() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to serialize OpenAPI document: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        },
    }
}
