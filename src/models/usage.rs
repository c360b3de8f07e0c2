// Usage snapshots and the summaries built from them

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::plan::Entitlement;

/// What a user currently consumes of their quotas
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct CurrentUsage {
    pub active_ads: i64,
    pub highlights_today: i64,
}

/// Usage as a rounded percentage of each cap
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct UsagePercentage {
    pub ads: i64,
    pub highlights: i64,
}

impl UsagePercentage {
    pub fn compute(limits: &Entitlement, usage: &CurrentUsage) -> Self {
        Self {
            ads: percent_of(usage.active_ads, limits.max_active_ads),
            highlights: percent_of(usage.highlights_today, limits.max_highlights_per_day),
        }
    }
}

/// Zero when the cap is zero or negative
fn percent_of(used: i64, cap: i32) -> i64 {
    if cap <= 0 {
        return 0;
    }
    (used as f64 / f64::from(cap) * 100.0).round() as i64
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlanUsageSummary {
    pub limits: Entitlement,
    pub current_usage: CurrentUsage,
    pub usage_percentage: UsagePercentage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentages_round() {
        let mut limits = Entitlement::SPECIAL_ACCOUNT;
        limits.max_active_ads = 3;
        limits.max_highlights_per_day = 8;

        let usage = CurrentUsage {
            active_ads: 2,
            highlights_today: 1,
        };

        let pct = UsagePercentage::compute(&limits, &usage);
        assert_eq!(pct.ads, 67);
        assert_eq!(pct.highlights, 13);
    }

    #[test]
    fn test_zero_cap_gives_zero_percent() {
        let mut limits = Entitlement::SPECIAL_ACCOUNT;
        limits.max_highlights_per_day = 0;

        let usage = CurrentUsage {
            active_ads: 0,
            highlights_today: 4,
        };

        assert_eq!(UsagePercentage::compute(&limits, &usage).highlights, 0);
    }

    #[test]
    fn test_over_cap_exceeds_hundred() {
        let mut limits = Entitlement::SPECIAL_ACCOUNT;
        limits.max_active_ads = 2;

        let usage = CurrentUsage {
            active_ads: 10,
            highlights_today: 0,
        };

        assert_eq!(UsagePercentage::compute(&limits, &usage).ads, 500);
    }
}
