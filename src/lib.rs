// Library exports for the classifieds plans backend
// This file exposes modules and functions for library consumers

pub mod app;
pub mod app_config;
pub mod config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use app::{build_router, AppState, RouterOptions};
pub use app_config::{AppConfig, CONFIG};
pub use config::SpecialUsersConfig;
pub use db::{DieselDatabaseConfig, DieselPool};
pub use middleware::{auth_middleware, AuthenticatedUser, CorsPolicy};
pub use models::auth::AccessTokenClaims;
pub use services::{
    DieselPlanStore, EntitlementService, EntitlementSettings, InMemoryPlanStore, JwtConfig,
    JwtError, JwtService, PlanStore, StoreError, ValidationResult,
};

use std::sync::Arc;

// Library initialization: pool, migrations and services from the global config
pub async fn initialize_app_state() -> Result<AppState, Box<dyn std::error::Error>> {
    use tracing::info;

    // Load environment
    dotenv::dotenv().ok();

    let config = app_config::config();

    info!("Initializing database pool...");
    let db_config = db::DieselDatabaseConfig::from(&config.database);
    let diesel_pool = db::create_diesel_pool(db_config).await?;

    info!("Running embedded migrations...");
    let migration_config = migrations::MigrationConfig::default();
    migrations::run_all_migrations(migration_config)
        .await
        .map_err(|e| format!("Migration failed: {}", e))?;

    let store: Arc<dyn PlanStore> = Arc::new(DieselPlanStore::new(diesel_pool));
    let jwt_service = Arc::new(JwtService::from_env());

    if config.plans.special_users.is_empty() {
        info!("[PLANS] No administrator or test accounts configured");
    }

    Ok(AppState::new(
        store,
        config.plans.special_users.clone(),
        EntitlementSettings::from(&config.plans),
        jwt_service,
    ))
}

/// Router options from the global config
pub fn router_options() -> RouterOptions {
    let config = app_config::config();
    RouterOptions {
        enable_api_docs: config.features.enable_api_docs,
        cors: CorsPolicy::new(config.cors_allowed_origins.clone(), config.is_production()),
    }
}

// Health check handler
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    operation_id = "healthCheck",
    responses(
        (status = 200, description = "Service healthy"),
        (status = 503, description = "Database unreachable")
    )
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    use axum::http::StatusCode;
    use axum::Json;

    let timestamp = chrono::Utc::now().to_rfc3339();

    let (overall_healthy, postgres_health) = match state.entitlements.health_check().await {
        Ok(()) => (
            true,
            serde_json::json!({
                "status": "healthy",
                "error": null
            }),
        ),
        Err(e) => (
            false,
            serde_json::json!({
                "status": "unhealthy",
                "error": format!("Database connection failed: {}", e)
            }),
        ),
    };

    let response = serde_json::json!({
        "status": if overall_healthy { "healthy" } else { "degraded" },
        "service": "classifieds-backend",
        "timestamp": timestamp,
        "components": {
            "postgresql": postgres_health
        }
    });

    if overall_healthy {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}
