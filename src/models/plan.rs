// Plan catalog model and the entitlement derived from it

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::schema::plans;

/// `ad_duration_days` value meaning ads never expire
pub const UNLIMITED_AD_DURATION: i32 = -1;

/// Depth of the statistics dashboard a plan unlocks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatisticsLevel {
    Basic,
    Advanced,
}

impl StatisticsLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticsLevel::Basic => "basic",
            StatisticsLevel::Advanced => "advanced",
        }
    }
}

impl FromStr for StatisticsLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(StatisticsLevel::Basic),
            "advanced" => Ok(StatisticsLevel::Advanced),
            _ => Err(format!("Invalid statistics level: {}", s)),
        }
    }
}

impl fmt::Display for StatisticsLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Support channel a plan is entitled to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SupportType {
    Email,
    Priority,
}

impl SupportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportType::Email => "email",
            SupportType::Priority => "priority",
        }
    }
}

impl FromStr for SupportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(SupportType::Email),
            "priority" => Ok(SupportType::Priority),
            _ => Err(format!("Invalid support type: {}", s)),
        }
    }
}

impl fmt::Display for SupportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plan database model
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize, ToSchema)]
#[diesel(table_name = plans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[schema(example = json!({
    "id": "123e4567-e89b-12d3-a456-426614174000",
    "name": "Pequena Empresa",
    "slug": "small_business",
    "description": "Para pequenos negócios",
    "price_monthly_cents": 4990,
    "price_yearly_cents": 49900,
    "max_ads": 5,
    "max_highlights_per_day": 2,
    "ad_duration_days": 90,
    "max_photos_per_ad": 10,
    "has_premium_features": true,
    "statistics_level": "advanced",
    "support_type": "priority",
    "has_search_highlight": false,
    "is_active": true,
    "created_at": "2025-01-01T12:00:00Z",
    "updated_at": "2025-01-01T12:00:00Z"
}))]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price_monthly_cents: i32,
    pub price_yearly_cents: i32,
    pub max_ads: i32,
    pub max_highlights_per_day: i32,
    pub ad_duration_days: i32,
    pub max_photos_per_ad: i32,
    pub has_premium_features: bool,
    pub statistics_level: Option<String>,
    pub support_type: Option<String>,
    pub has_search_highlight: Option<bool>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    /// Statistics level, `basic` when unset or unrecognised
    pub fn statistics_level_enum(&self) -> StatisticsLevel {
        match self.statistics_level.as_deref() {
            None => StatisticsLevel::Basic,
            Some(raw) => StatisticsLevel::from_str(raw).unwrap_or_else(|e| {
                tracing::warn!(
                    "Invalid statistics level '{}' on plan {}, defaulting to basic: {}",
                    raw,
                    self.slug,
                    e
                );
                StatisticsLevel::Basic
            }),
        }
    }

    /// Support type, `email` when unset or unrecognised
    pub fn support_type_enum(&self) -> SupportType {
        match self.support_type.as_deref() {
            None => SupportType::Email,
            Some(raw) => SupportType::from_str(raw).unwrap_or_else(|e| {
                tracing::warn!(
                    "Invalid support type '{}' on plan {}, defaulting to email: {}",
                    raw,
                    self.slug,
                    e
                );
                SupportType::Email
            }),
        }
    }

    pub fn entitlement(&self) -> Entitlement {
        Entitlement {
            max_active_ads: self.max_ads,
            max_highlights_per_day: self.max_highlights_per_day,
            ad_duration_days: self.ad_duration_days,
            max_photos_per_ad: self.max_photos_per_ad,
            has_premium_features: self.has_premium_features,
            statistics_level: self.statistics_level_enum(),
            support_type: self.support_type_enum(),
            has_search_highlight: self.has_search_highlight.unwrap_or(false),
        }
    }

    pub fn is_free(&self) -> bool {
        self.price_monthly_cents == 0
    }
}

/// Feature and quota bundle a user is entitled to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[schema(example = json!({
    "max_active_ads": 5,
    "max_highlights_per_day": 2,
    "ad_duration_days": 90,
    "max_photos_per_ad": 10,
    "has_premium_features": true,
    "statistics_level": "advanced",
    "support_type": "priority",
    "has_search_highlight": false
}))]
pub struct Entitlement {
    pub max_active_ads: i32,
    pub max_highlights_per_day: i32,
    /// Days until a new ad expires; `-1` means never
    pub ad_duration_days: i32,
    pub max_photos_per_ad: i32,
    pub has_premium_features: bool,
    pub statistics_level: StatisticsLevel,
    pub support_type: SupportType,
    pub has_search_highlight: bool,
}

impl Entitlement {
    /// Limits granted to administrator and test accounts
    pub const SPECIAL_ACCOUNT: Entitlement = Entitlement {
        max_active_ads: 999,
        max_highlights_per_day: 999,
        ad_duration_days: 365,
        max_photos_per_ad: 50,
        has_premium_features: true,
        statistics_level: StatisticsLevel::Advanced,
        support_type: SupportType::Priority,
        has_search_highlight: true,
    };

    pub fn has_unlimited_duration(&self) -> bool {
        self.ad_duration_days == UNLIMITED_AD_DURATION
    }

    pub fn allows_highlights(&self) -> bool {
        self.max_highlights_per_day > 0
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn plan(slug: &str, max_ads: i32, max_highlights_per_day: i32, ad_duration_days: i32) -> Plan {
        let now = Utc::now();
        Plan {
            id: Uuid::new_v4(),
            name: slug.to_string(),
            slug: slug.to_string(),
            description: None,
            price_monthly_cents: if slug == "free" { 0 } else { 4990 },
            price_yearly_cents: 0,
            max_ads,
            max_highlights_per_day,
            ad_duration_days,
            max_photos_per_ad: 5,
            has_premium_features: false,
            statistics_level: None,
            support_type: None,
            has_search_highlight: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
