// Authentication middleware for protected routes
// Validates JWT tokens and injects AuthenticatedUser into request extensions

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use uuid::Uuid;

use crate::{app::AppState, middleware::auth::AuthenticatedUser};

fn reject(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "message": message
        })),
    )
        .into_response()
}

/// Middleware function that validates JWT tokens and adds AuthenticatedUser to extensions
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        Some(token) if !token.trim().is_empty() => token.trim().to_string(),
        _ => {
            return reject(
                StatusCode::UNAUTHORIZED,
                "Missing or invalid authorization header",
            )
        },
    };

    let claims = match app_state.jwt_service.validate_access_token(&token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!("JWT validation failed: {}", e);
            return reject(StatusCode::UNAUTHORIZED, "Invalid or expired token");
        },
    };

    let user_id = match Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!("JWT subject is not a user id: {}", claims.sub);
            return reject(StatusCode::UNAUTHORIZED, "Invalid or expired token");
        },
    };

    request.extensions_mut().insert(AuthenticatedUser {
        user_id,
        token_id: claims.jti,
        email: claims.email,
    });

    next.run(request).await
}

/// Allows the request through only for accounts on the admin allow-list.
/// Must run after `auth_middleware`.
pub async fn require_admin(
    State(app_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(user) = request.extensions().get::<AuthenticatedUser>().cloned() else {
        return reject(StatusCode::UNAUTHORIZED, "Authentication required");
    };

    let record = app_state.entitlements.is_special_user(user.user_id).await;
    if !record.is_admin {
        tracing::warn!("Non-admin user {} attempted an admin operation", user.user_id);
        return reject(StatusCode::FORBIDDEN, "Administrator access required");
    }

    next.run(request).await
}

/// Extractor for AuthenticatedUser from request extensions
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "success": false,
                        "message": "Authentication required"
                    })),
                )
            })
    }
}
