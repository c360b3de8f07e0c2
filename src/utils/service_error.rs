// Service error type shared by the HTTP handlers
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::entitlements::{PlanChangeError, ResolutionError};
use crate::services::plan_store::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Could not verify plan limits")]
    PlanUnverifiable,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ServiceError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            },
            ServiceError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            ServiceError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            ServiceError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ServiceError::PlanUnverifiable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not verify plan limits".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

// Conversion from various error types
impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(what) => ServiceError::NotFound(what.to_string()),
            _ => ServiceError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ResolutionError> for ServiceError {
    fn from(error: ResolutionError) -> Self {
        tracing::error!("[PLANS] {}", error);
        ServiceError::PlanUnverifiable
    }
}

impl From<PlanChangeError> for ServiceError {
    fn from(error: PlanChangeError) -> Self {
        match error {
            PlanChangeError::TargetPlanNotFound => ServiceError::NotFound("Plan".to_string()),
            PlanChangeError::UserNotFound => ServiceError::NotFound("User".to_string()),
            PlanChangeError::InactivePlan(_) => ServiceError::Conflict(error.to_string()),
            PlanChangeError::Store(e) => ServiceError::from(e),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(error: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ServiceError::NotFound("Plan".into()), StatusCode::NOT_FOUND),
            (ServiceError::ValidationError("bad".into()), StatusCode::BAD_REQUEST),
            (ServiceError::PlanUnverifiable, StatusCode::INTERNAL_SERVER_ERROR),
            (ServiceError::Conflict("inactive".into()), StatusCode::CONFLICT),
            (ServiceError::DatabaseError("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_plan_change_error_mapping() {
        assert!(matches!(
            ServiceError::from(PlanChangeError::TargetPlanNotFound),
            ServiceError::NotFound(ref w) if w == "Plan"
        ));
        assert!(matches!(
            ServiceError::from(PlanChangeError::InactivePlan("legacy".into())),
            ServiceError::Conflict(_)
        ));
        assert!(matches!(
            ServiceError::from(PlanChangeError::Store(StoreError::Pool("timeout".into()))),
            ServiceError::DatabaseError(_)
        ));
    }
}
