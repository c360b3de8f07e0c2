// Application state and router assembly
use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::{
    config::SpecialUsersConfig,
    handlers,
    middleware::{auth_middleware, dynamic_cors_middleware, require_admin, CorsPolicy},
    services::{
        EntitlementService, EntitlementSettings, JwtService, PlanStore, SpecialUserClassifier,
    },
};

// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PlanStore>,
    pub entitlements: Arc<EntitlementService>,
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PlanStore>,
        special_users: SpecialUsersConfig,
        settings: EntitlementSettings,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        let classifier = SpecialUserClassifier::new(Arc::new(special_users));
        let entitlements = Arc::new(EntitlementService::new(store.clone(), classifier, settings));

        Self {
            store,
            entitlements,
            jwt_service,
        }
    }
}

/// Router settings that do not live in `AppState`
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub enable_api_docs: bool,
    pub cors: CorsPolicy,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            enable_api_docs: false,
            cors: CorsPolicy::new(vec!["*".to_string()], false),
        }
    }
}

/// Build the `/api/v1` router
pub fn build_router(state: AppState, options: RouterOptions) -> Router {
    let admin = handlers::admin_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_admin,
    ));

    // auth_middleware runs before require_admin
    let protected = Router::new()
        .nest("/me/plan", handlers::my_plan_routes())
        .nest("/admin", admin)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let mut api = Router::new()
        .route("/health", get(crate::health_check))
        .merge(handlers::public_plan_routes())
        .merge(protected);

    if options.enable_api_docs {
        api = api.route(
            "/docs/openapi.json",
            get(handlers::docs::serve_openapi_spec),
        );
    }

    Router::new()
        .nest("/api/v1", api)
        .layer(middleware::from_fn_with_state(
            Arc::new(options.cors),
            dynamic_cors_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
