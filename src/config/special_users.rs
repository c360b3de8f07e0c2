// Special-account allow-lists: administrators and test accounts
// These accounts bypass plan quotas.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Two allow-lists of lower-cased emails
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialUsersConfig {
    pub admin_emails: HashSet<String>,
    pub test_emails: HashSet<String>,
}

impl SpecialUsersConfig {
    pub fn new<A, T>(admin_emails: A, test_emails: T) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        Self {
            admin_emails: normalize_all(admin_emails),
            test_emails: normalize_all(test_emails),
        }
    }

    /// Build from the raw comma separated env values
    pub fn from_lists(admin_emails: &str, test_emails: &str) -> Self {
        Self {
            admin_emails: parse_email_list(admin_emails),
            test_emails: parse_email_list(test_emails),
        }
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.contains(&normalize_email(email))
    }

    pub fn is_test_email(&self, email: &str) -> bool {
        self.test_emails.contains(&normalize_email(email))
    }

    pub fn is_empty(&self) -> bool {
        self.admin_emails.is_empty() && self.test_emails.is_empty()
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Split a comma separated list, lower-case entries and drop blanks
pub fn parse_email_list(raw: &str) -> HashSet<String> {
    normalize_all(raw.split(','))
}

fn normalize_all<I>(emails: I) -> HashSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    emails
        .into_iter()
        .map(|e| normalize_email(e.as_ref()))
        .filter(|e| !e.is_empty())
        .collect()
}
