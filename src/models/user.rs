// User Database Model

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::schema::users;

/// User database model - queryable from database
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
    pub user_type: String,
    /// Denormalized slug of the current plan
    pub subscription_plan: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Stored email lower-cased and trimmed, `None` when blank
    pub fn normalized_email(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
    }
}

/// Public view of a user, as returned alongside subscription data
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub user_type: String,
    pub subscription_plan: Option<String>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            user_type: user.user_type,
            subscription_plan: user.subscription_plan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_email(email: Option<&str>) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: email.map(str::to_string),
            name: Some("Maria".to_string()),
            user_type: "personal".to_string(),
            subscription_plan: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_normalized_email() {
        assert_eq!(
            user_with_email(Some("  Admin@Example.COM ")).normalized_email(),
            Some("admin@example.com".to_string())
        );
        assert_eq!(user_with_email(Some("   ")).normalized_email(), None);
        assert_eq!(user_with_email(None).normalized_email(), None);
    }

    #[test]
    fn test_summary_from_user() {
        let user = user_with_email(Some("maria@example.com"));
        let id = user.id;
        let summary = UserSummary::from(user);

        assert_eq!(summary.id, id);
        assert_eq!(summary.email.as_deref(), Some("maria@example.com"));
        assert_eq!(summary.user_type, "personal");
    }
}
