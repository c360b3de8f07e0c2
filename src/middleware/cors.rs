use axum::{
    body::Body,
    extract::State,
    http::{
        header::{self, HeaderValue},
        Method, Request, Response, StatusCode,
    },
    middleware::Next,
};
use std::sync::Arc;
use tracing::debug;

/// Which origins may call the API
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    pub allowed_origins: Vec<String>,
    /// Reflect any origin when the list contains `*`
    pub reflect_wildcard: bool,
}

impl CorsPolicy {
    pub fn new(allowed_origins: Vec<String>, is_production: bool) -> Self {
        Self {
            allowed_origins,
            reflect_wildcard: !is_production,
        }
    }

    pub fn allowed_origin(&self, origin: Option<&str>) -> Option<HeaderValue> {
        let origin = origin?;
        let has_wildcard = self.allowed_origins.iter().any(|o| o == "*");

        if (has_wildcard && self.reflect_wildcard) || self.allowed_origins.iter().any(|o| o == origin) {
            debug!("CORS: Origin allowed: {}", origin);
            HeaderValue::from_str(origin).ok()
        } else {
            debug!("CORS: Origin not in whitelist: {}", origin);
            None
        }
    }
}

/// CORS middleware supporting credentials; wildcard origins are reflected outside production
pub async fn dynamic_cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response<Body>, StatusCode> {
    let allowed_origin = policy.allowed_origin(
        req.headers()
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok()),
    );

    // Handle preflight OPTIONS requests
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());

        if let Some(allowed) = allowed_origin {
            let headers = response.headers_mut();
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allowed);
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("GET, POST, PUT, OPTIONS"),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("content-type, authorization, accept, origin"),
            );
            headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("3600"));
        }

        *response.status_mut() = StatusCode::OK;
        return Ok(response);
    }

    let mut response = next.run(req).await;

    if let Some(allowed) = allowed_origin {
        response
            .headers_mut()
            .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allowed);
        response.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    }

    Ok(response)
}
