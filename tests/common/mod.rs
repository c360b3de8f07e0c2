// Common test utilities shared across integration tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use classifieds_backend::{
    build_router,
    models::{AdStatus, SubscriptionStatus, User},
    services::{JwtConfig, JwtService, SpecialUserClassifier},
    AppState, EntitlementService, EntitlementSettings, InMemoryPlanStore, RouterOptions,
    SpecialUsersConfig,
};
use serde::Serialize;
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@classificados.com";
pub const TEST_ACCOUNT_EMAIL: &str = "qa@classificados.com";

const TEST_SECRET: &str = "integration-test-secret-with-32-plus-chars";

pub fn special_users() -> SpecialUsersConfig {
    SpecialUsersConfig::new([ADMIN_EMAIL], [TEST_ACCOUNT_EMAIL])
}

/// Entitlement service over a seeded in-memory store
pub fn entitlement_service(store: Arc<InMemoryPlanStore>) -> EntitlementService {
    EntitlementService::new(
        store,
        SpecialUserClassifier::new(Arc::new(special_users())),
        EntitlementSettings::default(),
    )
}

fn app_state(store: Arc<InMemoryPlanStore>) -> AppState {
    let jwt_service = Arc::new(JwtService::new(JwtConfig::new(
        TEST_SECRET,
        3600,
        "classificados".to_string(),
        "classificados".to_string(),
    )));

    AppState::new(
        store,
        special_users(),
        EntitlementSettings::default(),
        jwt_service,
    )
}

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub store: Arc<InMemoryPlanStore>,
    pub jwt_service: Arc<JwtService>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(InMemoryPlanStore::with_marketplace_plans())
    }

    pub fn with_store(store: InMemoryPlanStore) -> Self {
        let store = Arc::new(store);
        let state = app_state(store.clone());
        let jwt_service = state.jwt_service.clone();

        let app = build_router(
            state,
            RouterOptions {
                enable_api_docs: true,
                ..RouterOptions::default()
            },
        );

        Self {
            app,
            store,
            jwt_service,
        }
    }

    /// Create a user and a bearer token for them
    pub async fn user_with_token(&self, email: Option<&str>) -> (User, String) {
        let user = self.store.add_user(email).await;
        let token = self.token_for(&user);
        (user, token)
    }

    pub fn token_for(&self, user: &User) -> String {
        self.jwt_service
            .generate_access_token(&user.id.to_string(), user.email.as_deref().unwrap_or(""))
            .unwrap()
    }

    /// Put `user_id` on an active subscription of `slug`
    pub async fn subscribe(&self, user_id: Uuid, slug: &str) {
        let plan = self.store.plan(slug).await.unwrap();
        self.store
            .add_subscription(user_id, plan.id, SubscriptionStatus::Active, chrono::Utc::now())
            .await;
    }

    pub async fn add_pending_ads(&self, user_id: Uuid, count: usize) {
        self.store
            .add_ads(user_id, count, AdStatus::Pending, None)
            .await;
    }

    pub fn get(&self, uri: &str) -> TestRequest<'_> {
        TestRequest::new(self, "GET", uri)
    }

    pub fn post(&self, uri: &str) -> TestRequest<'_> {
        TestRequest::new(self, "POST", uri)
    }

    pub fn put(&self, uri: &str) -> TestRequest<'_> {
        TestRequest::new(self, "PUT", uri)
    }

    pub fn options(&self, uri: &str) -> TestRequest<'_> {
        TestRequest::new(self, "OPTIONS", uri)
    }
}

/// Test request builder
pub struct TestRequest<'a> {
    app: &'a TestApp,
    method: &'static str,
    uri: String,
    token: Option<String>,
    origin: Option<String>,
    body: Option<Vec<u8>>,
}

impl<'a> TestRequest<'a> {
    fn new(app: &'a TestApp, method: &'static str, uri: &str) -> Self {
        Self {
            app,
            method,
            uri: uri.to_string(),
            token: None,
            origin: None,
            body: None,
        }
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn origin(mut self, origin: &str) -> Self {
        self.origin = Some(origin.to_string());
        self
    }

    /// Add JSON body to request
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        self.body = Some(serde_json::to_vec(body).unwrap());
        self
    }

    /// Send the request
    pub async fn send(self) -> TestResponse {
        let mut builder = Request::builder().method(self.method).uri(&self.uri);

        if let Some(token) = &self.token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(origin) = &self.origin {
            builder = builder.header(header::ORIGIN, origin.as_str());
        }

        let request = match self.body {
            Some(bytes) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(bytes))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.app.clone().oneshot(request).await.unwrap();

        TestResponse { response }
    }
}

/// Test response wrapper
pub struct TestResponse {
    response: Response<Body>,
}

impl TestResponse {
    /// Get status code
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Parse JSON response
    pub async fn json(self) -> serde_json::Value {
        let body = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }
}
