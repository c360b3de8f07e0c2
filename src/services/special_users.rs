// Special-user classification: administrators and test accounts are exempt
// from plan quotas. Lookup failures classify the account as regular.

use serde::Serialize;
use std::sync::Arc;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::SpecialUsersConfig;
use crate::services::plan_store::PlanStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SpecialUserRecord {
    pub is_special: bool,
    pub is_admin: bool,
    pub is_test: bool,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SpecialUserClassifier {
    config: Arc<SpecialUsersConfig>,
}

impl SpecialUserClassifier {
    pub fn new(config: Arc<SpecialUsersConfig>) -> Self {
        Self { config }
    }

    /// Classify an email address against the allow-lists
    pub fn classify_email(&self, email: &str) -> SpecialUserRecord {
        let email = crate::config::special_users::normalize_email(email);
        if email.is_empty() {
            return SpecialUserRecord::default();
        }

        let is_admin = self.config.admin_emails.contains(&email);
        let is_test = self.config.test_emails.contains(&email);

        SpecialUserRecord {
            is_special: is_admin || is_test,
            is_admin,
            is_test,
            email: Some(email),
        }
    }

    /// Classify a user by their stored email; never fails
    pub async fn classify(&self, store: &dyn PlanStore, user_id: Uuid) -> SpecialUserRecord {
        match store.find_user(user_id).await {
            Ok(Some(user)) => match user.normalized_email() {
                Some(email) => self.classify_email(&email),
                None => SpecialUserRecord::default(),
            },
            Ok(None) => SpecialUserRecord::default(),
            Err(e) => {
                warn!(
                    "[PLANS] Special-user lookup failed for {}, treating as regular: {}",
                    user_id, e
                );
                SpecialUserRecord::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::plan_store::{FailurePoint, InMemoryPlanStore};

    fn classifier() -> SpecialUserClassifier {
        SpecialUserClassifier::new(Arc::new(SpecialUsersConfig::new(
            ["admin@classificados.com"],
            ["qa@classificados.com"],
        )))
    }

    #[test]
    fn test_classify_email() {
        let c = classifier();

        let admin = c.classify_email("Admin@Classificados.com");
        assert!(admin.is_special && admin.is_admin && !admin.is_test);
        assert_eq!(admin.email.as_deref(), Some("admin@classificados.com"));

        let qa = c.classify_email("qa@classificados.com");
        assert!(qa.is_special && qa.is_test && !qa.is_admin);

        let regular = c.classify_email("joao@example.com");
        assert!(!regular.is_special);
        assert_eq!(regular.email.as_deref(), Some("joao@example.com"));

        assert_eq!(c.classify_email("  "), SpecialUserRecord::default());
    }

    #[tokio::test]
    async fn test_classify_by_user_id() {
        let store = InMemoryPlanStore::new();
        let admin = store.add_user(Some("ADMIN@classificados.com")).await;
        let anonymous = store.add_user(None).await;

        let c = classifier();
        assert!(c.classify(&store, admin.id).await.is_admin);
        assert_eq!(c.classify(&store, anonymous.id).await, SpecialUserRecord::default());
        assert_eq!(c.classify(&store, Uuid::new_v4()).await, SpecialUserRecord::default());
    }

    #[tokio::test]
    async fn test_lookup_failure_fails_closed() {
        let store = InMemoryPlanStore::new();
        let admin = store.add_user(Some("admin@classificados.com")).await;
        store.fail(FailurePoint::UserLookup).await;

        let record = classifier().classify(&store, admin.id).await;
        assert!(!record.is_special);
        assert!(!record.is_admin);
        assert!(record.email.is_none());
    }
}
