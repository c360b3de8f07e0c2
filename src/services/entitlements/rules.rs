// Pure quota rules: no I/O, every input passed in

use chrono::{DateTime, Duration, NaiveTime, Utc};

use super::types::Denial;
use crate::models::{CurrentUsage, Entitlement, Plan};

/// Start (00:00:00.000) and end (23:59:59.999) of the UTC day containing `now`
pub fn utc_day_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::days(1) - Duration::milliseconds(1);
    (start, end)
}

/// Expiry for an ad created now; `None` for unlimited durations
pub fn calculate_ad_expiration_date(limits: &Entitlement) -> Option<DateTime<Utc>> {
    ad_expiration_from(limits, Utc::now())
}

pub fn ad_expiration_from(limits: &Entitlement, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if limits.has_unlimited_duration() {
        return None;
    }
    now.checked_add_signed(Duration::days(i64::from(limits.ad_duration_days)))
}

/// Equality denies: a user at the cap cannot create another ad
pub fn check_ad_quota(limits: &Entitlement, active_ads: i64) -> Result<(), Denial> {
    if active_ads >= i64::from(limits.max_active_ads) {
        return Err(Denial::AdLimitReached {
            limit: limits.max_active_ads,
            active: active_ads,
        });
    }
    Ok(())
}

pub fn check_highlight_quota(limits: &Entitlement, highlights_today: i64) -> Result<(), Denial> {
    if !limits.allows_highlights() {
        return Err(Denial::HighlightsNotAllowed);
    }
    if highlights_today >= i64::from(limits.max_highlights_per_day) {
        return Err(Denial::HighlightLimitReached {
            limit: limits.max_highlights_per_day,
            today: highlights_today,
        });
    }
    Ok(())
}

/// Warnings for moving from `current` to `target`; never blocks the change
pub fn plan_change_warnings(
    current: &Entitlement,
    target: &Entitlement,
    usage: &CurrentUsage,
) -> Vec<String> {
    let mut warnings = Vec::new();

    if usage.active_ads > i64::from(target.max_active_ads) {
        warnings.push(format!(
            "User has {} active ads, but the new plan allows only {}. Ads above the limit stay active until they expire.",
            usage.active_ads, target.max_active_ads
        ));
    }

    if target.max_highlights_per_day < current.max_highlights_per_day {
        warnings.push(format!(
            "The new plan lowers the daily highlight limit from {} to {}.",
            current.max_highlights_per_day, target.max_highlights_per_day
        ));

        if usage.highlights_today > i64::from(target.max_highlights_per_day) {
            warnings.push(format!(
                "User already created {} highlights today, above the new daily limit of {}.",
                usage.highlights_today, target.max_highlights_per_day
            ));
        }
    }

    warnings
}

/// Notices describing how the new plan applies to current usage
pub fn applied_change_notices(plan: &Plan, usage: &CurrentUsage, user_updated: bool) -> Vec<String> {
    let limits = plan.entitlement();
    let mut notices = Vec::new();

    if usage.active_ads > i64::from(limits.max_active_ads) {
        notices.push(format!(
            "{} active ads exceed the limit of {}. Ads above the limit stay active until they expire.",
            usage.active_ads, limits.max_active_ads
        ));
    } else {
        notices.push(format!(
            "{} active ads within the new limit of {}.",
            usage.active_ads, limits.max_active_ads
        ));
    }

    if !limits.allows_highlights() {
        notices.push("Plan does not allow new highlights.".to_string());
    } else if usage.highlights_today >= i64::from(limits.max_highlights_per_day) {
        notices.push(format!(
            "{} highlights created today reach the daily limit of {}.",
            usage.highlights_today, limits.max_highlights_per_day
        ));
    } else {
        let remaining = i64::from(limits.max_highlights_per_day) - usage.highlights_today;
        notices.push(format!("{} highlights remaining today.", remaining));
    }

    if user_updated {
        notices.push(format!("User record updated to the {} plan.", plan.name));
    }

    notices.push(format!("New simultaneous ad limit: {}", limits.max_active_ads));
    notices.push(format!("New daily highlight limit: {}", limits.max_highlights_per_day));
    if limits.has_unlimited_duration() {
        notices.push("Ad duration: unlimited".to_string());
    } else {
        notices.push(format!("Ad duration: {} days", limits.ad_duration_days));
    }
    notices.push(format!("Maximum photos per ad: {}", limits.max_photos_per_ad));

    notices
}
