// HTTP handlers and route builders

pub mod admin;
pub mod docs;
pub mod plans;

use crate::app::AppState;
use axum::{
    routing::{get, post},
    Router,
};

// Public plan routes
pub fn public_plan_routes() -> Router<AppState> {
    Router::new().route("/plans", get(plans::list_plans))
}

// Routes for the authenticated user's own plan
pub fn my_plan_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(plans::get_my_plan))
        .route("/validation/ad", get(plans::validate_ad))
        .route("/validation/highlight", get(plans::validate_highlight))
        .route("/validation/change", post(plans::validate_plan_change))
        .route("/ad-expiration", get(plans::get_ad_expiration))
}

// Administrator routes
pub fn admin_routes() -> Router<AppState> {
    Router::new().route(
        "/users/{id}/subscription",
        get(admin::get_user_subscription).put(admin::change_user_plan),
    )
}
