// Services module: business logic layer for the application

pub mod entitlements;
pub mod jwt;
pub mod plan_store;
pub mod special_users;

// Re-export commonly used services
pub use entitlements::{
    EntitlementService, EntitlementSettings, PlanChangeError, PlanChangeReport, ResolutionError,
    ValidationOutcome, ValidationResult,
};
pub use jwt::{JwtConfig, JwtError, JwtService};
pub use plan_store::{DieselPlanStore, InMemoryPlanStore, PlanStore, StoreError};
pub use special_users::{SpecialUserClassifier, SpecialUserRecord};
