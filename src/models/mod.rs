pub mod ad;
pub mod auth;
pub mod plan;
pub mod subscription;
pub mod usage;
pub mod user;

// Re-export common types
pub use ad::{Ad, AdStatus, Highlight};
pub use auth::*;
pub use plan::{Entitlement, Plan, StatisticsLevel, SupportType, UNLIMITED_AD_DURATION};
pub use subscription::{NewSubscription, Subscription, SubscriptionStatus};
pub use usage::{CurrentUsage, PlanUsageSummary, UsagePercentage};
pub use user::{User, UserSummary};
