// Entitlement resolution, usage counting and quota decisions

mod common;

use chrono::{Duration, Utc};
use classifieds_backend::{
    models::{AdStatus, Entitlement, SubscriptionStatus},
    services::{
        entitlements::{
            calculate_ad_expiration_date, types::UNVERIFIABLE_MESSAGE, utc_day_bounds,
            ResolutionError,
        },
        plan_store::FailurePoint,
        ValidationOutcome,
    },
    InMemoryPlanStore,
};
use common::{entitlement_service, ADMIN_EMAIL, TEST_ACCOUNT_EMAIL};
use std::sync::Arc;

fn seeded_store() -> Arc<InMemoryPlanStore> {
    Arc::new(InMemoryPlanStore::with_marketplace_plans())
}

#[tokio::test]
async fn test_user_without_subscription_gets_free_plan() {
    let store = seeded_store();
    let user = store.add_user(Some("ana@example.com")).await;
    let service = entitlement_service(store);

    let limits = service.get_user_plan_limits(user.id).await.unwrap();
    assert_eq!(limits.max_active_ads, 1);
    assert_eq!(limits.max_highlights_per_day, 0);
    assert_eq!(limits.ad_duration_days, 30);
}

#[tokio::test]
async fn test_active_subscription_determines_limits() {
    let store = seeded_store();
    let user = store.add_user(None).await;
    let small = store.plan("small_business").await.unwrap();
    let plus = store.plan("business_plus").await.unwrap();

    // Cancelled subscriptions are ignored
    store
        .add_subscription(user.id, plus.id, SubscriptionStatus::Cancelled, Utc::now())
        .await;
    store
        .add_subscription(
            user.id,
            small.id,
            SubscriptionStatus::Active,
            Utc::now() - Duration::days(3),
        )
        .await;

    let limits = entitlement_service(store)
        .get_user_plan_limits(user.id)
        .await
        .unwrap();
    assert_eq!(limits, small.entitlement());
    assert_eq!(limits.max_active_ads, 5);
}

#[tokio::test]
async fn test_missing_free_plan_is_a_resolution_error() {
    let store = seeded_store();
    store.remove_plan("free").await;
    let user = store.add_user(None).await;
    let service = entitlement_service(store);

    assert!(matches!(
        service.get_user_plan_limits(user.id).await,
        Err(ResolutionError::FreePlanMissing(ref slug)) if slug == "free"
    ));

    let result = service.validate_ad_creation(user.id).await;
    assert!(!result.success);
    assert_eq!(result.outcome, ValidationOutcome::Unverifiable);
    assert_eq!(result.message.as_deref(), Some(UNVERIFIABLE_MESSAGE));
}

#[tokio::test]
async fn test_ad_limit_boundary_denies_at_equality() {
    let store = seeded_store();
    let user = store.add_user(Some("loja@example.com")).await;
    let small = store.plan("small_business").await.unwrap();
    store
        .add_subscription(user.id, small.id, SubscriptionStatus::Active, Utc::now())
        .await;
    store.add_ads(user.id, 4, AdStatus::Approved, None).await;
    let service = entitlement_service(store.clone());

    let below = service.validate_ad_creation(user.id).await;
    assert!(below.success);
    assert_eq!(below.current_usage.unwrap().active_ads, 4);

    store.add_ads(user.id, 1, AdStatus::Pending, None).await;

    let at_limit = service.validate_ad_creation(user.id).await;
    assert!(!at_limit.success);
    assert_eq!(at_limit.outcome, ValidationOutcome::Denied);
    assert_eq!(at_limit.current_usage.unwrap().active_ads, 5);
    assert!(at_limit.message.unwrap().contains("limit of 5 active ads"));
}

#[tokio::test]
async fn test_only_live_pending_and_approved_ads_count() {
    let store = seeded_store();
    let user = store.add_user(None).await;
    let now = Utc::now();

    store.add_ads(user.id, 1, AdStatus::Pending, None).await;
    store
        .add_ads(user.id, 1, AdStatus::Approved, Some(now + Duration::days(2)))
        .await;
    store
        .add_ads(user.id, 2, AdStatus::Approved, Some(now - Duration::days(1)))
        .await;
    store.add_ads(user.id, 1, AdStatus::Active, None).await;
    store.add_ads(user.id, 1, AdStatus::Rejected, None).await;
    store.add_ads(user.id, 1, AdStatus::Expired, None).await;

    let service = entitlement_service(store);
    assert_eq!(service.get_user_active_ads_count(user.id).await, 2);
}

#[tokio::test]
async fn test_highlights_counted_for_current_utc_day_only() {
    let store = seeded_store();
    let user = store.add_user(None).await;
    let now = Utc::now();
    let (start, end) = utc_day_bounds(now);

    store.add_highlight(user.id, start).await;
    store.add_highlight(user.id, end).await;
    store.add_highlight(user.id, start - Duration::milliseconds(1)).await;
    store.add_highlight(user.id, end + Duration::milliseconds(1)).await;

    let service = entitlement_service(store);
    assert_eq!(service.get_user_highlights_today(user.id).await, 2);
}

#[tokio::test]
async fn test_free_user_highlight_denied_with_upgrade_hint() {
    let store = seeded_store();
    let user = store.add_user(Some("ana@example.com")).await;

    let result = entitlement_service(store)
        .validate_highlight_creation(user.id)
        .await;

    assert!(!result.success);
    assert_eq!(result.outcome, ValidationOutcome::Denied);
    assert!(result.message.unwrap().to_lowercase().contains("upgrade"));
    assert_eq!(result.limits.unwrap().max_highlights_per_day, 0);
}

#[tokio::test]
async fn test_daily_highlight_limit() {
    let store = seeded_store();
    let user = store.add_user(None).await;
    let micro = store.plan("micro_business").await.unwrap();
    store
        .add_subscription(user.id, micro.id, SubscriptionStatus::Active, Utc::now())
        .await;
    let service = entitlement_service(store.clone());

    assert!(service.validate_highlight_creation(user.id).await.success);

    store.add_highlight(user.id, Utc::now()).await;

    let result = service.validate_highlight_creation(user.id).await;
    assert!(!result.success);
    assert_eq!(result.current_usage.unwrap().highlights_today, 1);
}

#[tokio::test]
async fn test_highlight_validation_is_idempotent() {
    let store = seeded_store();
    let user = store.add_user(None).await;
    let small = store.plan("small_business").await.unwrap();
    store
        .add_subscription(user.id, small.id, SubscriptionStatus::Active, Utc::now())
        .await;
    store.add_highlight(user.id, Utc::now()).await;
    let service = entitlement_service(store);

    let first = service.validate_highlight_creation(user.id).await;
    let second = service.validate_highlight_creation(user.id).await;

    assert_eq!(first.success, second.success);
    assert_eq!(first.message, second.message);
    assert_eq!(first.limits, second.limits);
    assert_eq!(first.current_usage, second.current_usage);
}

#[tokio::test]
async fn test_admin_highlight_always_allowed() {
    let store = seeded_store();
    let admin = store.add_user(Some(ADMIN_EMAIL)).await;

    let result = entitlement_service(store)
        .validate_highlight_creation(admin.id)
        .await;

    assert!(result.success);
    let limits = result.limits.unwrap();
    assert_eq!(limits.max_highlights_per_day, 999);
    assert_eq!(limits, Entitlement::SPECIAL_ACCOUNT);
    assert_eq!(
        result.message.as_deref(),
        Some("Administrator account with unlimited highlights")
    );
}

#[tokio::test]
async fn test_test_account_bypasses_ad_limit_with_email_case_differences() {
    let store = seeded_store();
    let qa = store.add_user(Some(&TEST_ACCOUNT_EMAIL.to_uppercase())).await;
    store.add_ads(qa.id, 40, AdStatus::Approved, None).await;

    let result = entitlement_service(store).validate_ad_creation(qa.id).await;
    assert!(result.success);
    assert_eq!(result.current_usage.unwrap().active_ads, 40);
}

#[tokio::test]
async fn test_special_bypass_survives_missing_free_plan() {
    let store = seeded_store();
    store.remove_plan("free").await;
    let admin = store.add_user(Some(ADMIN_EMAIL)).await;

    let result = entitlement_service(store).validate_ad_creation(admin.id).await;
    assert!(result.success);
}

#[tokio::test]
async fn test_count_failures_fail_open() {
    let store = seeded_store();
    let user = store.add_user(None).await;
    let micro = store.plan("micro_business").await.unwrap();
    store
        .add_subscription(user.id, micro.id, SubscriptionStatus::Active, Utc::now())
        .await;
    store.add_ads(user.id, 2, AdStatus::Approved, None).await;
    store.fail(FailurePoint::AdCount).await;
    store.fail(FailurePoint::HighlightCount).await;
    let service = entitlement_service(store.clone());

    assert!(service.active_ads_count(user.id).await.is_err());
    assert_eq!(service.get_user_active_ads_count(user.id).await, 0);
    assert_eq!(service.get_user_highlights_today(user.id).await, 0);

    // The counter reads 0, so creation is allowed despite two live ads
    let result = service.validate_ad_creation(user.id).await;
    assert!(result.success);
    assert_eq!(result.current_usage.unwrap().active_ads, 0);

    store.recover(FailurePoint::AdCount).await;
    assert!(!service.validate_ad_creation(user.id).await.success);
}

#[tokio::test]
async fn test_classifier_failure_treats_admin_as_regular() {
    let store = seeded_store();
    let admin = store.add_user(Some(ADMIN_EMAIL)).await;
    store.fail(FailurePoint::UserLookup).await;
    let service = entitlement_service(store);

    assert!(!service.is_special_user(admin.id).await.is_special);

    // Free plan applies: no highlights
    let result = service.validate_highlight_creation(admin.id).await;
    assert!(!result.success);
    assert_eq!(result.outcome, ValidationOutcome::Denied);
}

#[tokio::test]
async fn test_ad_expiration_dates() {
    let store = seeded_store();
    let user = store.add_user(None).await;
    let plus = store.plan("business_plus").await.unwrap();

    assert_eq!(calculate_ad_expiration_date(&plus.entitlement()), None);

    let limits = entitlement_service(store)
        .effective_limits(user.id)
        .await
        .unwrap();
    let expires_at = calculate_ad_expiration_date(&limits).unwrap();
    let expected = Utc::now() + Duration::days(30);
    assert!((expires_at - expected).num_milliseconds().abs() <= 1000);
}

#[tokio::test]
async fn test_plan_usage_summary_percentages() {
    let store = seeded_store();
    let user = store.add_user(None).await;
    let small = store.plan("small_business").await.unwrap();
    store
        .add_subscription(user.id, small.id, SubscriptionStatus::Active, Utc::now())
        .await;
    store.add_ads(user.id, 2, AdStatus::Approved, None).await;
    store.add_highlight(user.id, Utc::now()).await;

    let summary = entitlement_service(store)
        .get_user_plan_usage(user.id)
        .await
        .unwrap();

    assert_eq!(summary.limits.max_active_ads, 5);
    assert_eq!(summary.current_usage.active_ads, 2);
    assert_eq!(summary.usage_percentage.ads, 40);
    assert_eq!(summary.usage_percentage.highlights, 50);
}

#[tokio::test]
async fn test_free_plan_usage_has_zero_highlight_percentage() {
    let store = seeded_store();
    let user = store.add_user(None).await;
    store.add_highlight(user.id, Utc::now()).await;

    let summary = entitlement_service(store)
        .get_user_plan_usage(user.id)
        .await
        .unwrap();

    assert_eq!(summary.usage_percentage.highlights, 0);
    assert_eq!(summary.usage_percentage.ads, 0);
}
