//! Expiry classification relative to "now".
//!
//! An expiry date is a calendar date; comparisons happen at the instant the
//! date begins (00:00 UTC), so an item expiring today counts as expired once
//! the day has started.

use core::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use labtrack_core::DomainError;

/// Window of the "expiring soon" filter and badge.
pub const EXPIRING_SOON_DAYS: i64 = 30;

/// Upper bound of the "expiring later" badge.
pub const EXPIRING_LATER_DAYS: i64 = 90;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// The instant an expiry date begins.
pub fn expiry_instant(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Whole days until `date`, rounded up (negative once the date has passed).
pub fn days_until_expiry(date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let millis = (expiry_instant(date) - now).num_milliseconds();
    -((-millis).div_euclid(MILLIS_PER_DAY))
}

/// Expiry-status filter of the listing view.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpiryFilter {
    #[default]
    All,
    Expired,
    ExpiringSoon,
    Valid,
}

impl ExpiryFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpiryFilter::All => "all",
            ExpiryFilter::Expired => "expired",
            ExpiryFilter::ExpiringSoon => "expiring-soon",
            ExpiryFilter::Valid => "valid",
        }
    }

    /// Whether an item with `expiry` passes this filter at `now`.
    ///
    /// Items without an expiry date only pass `All`.
    pub fn matches(&self, expiry: Option<NaiveDate>, now: DateTime<Utc>) -> bool {
        if *self == ExpiryFilter::All {
            return true;
        }
        let Some(date) = expiry else {
            return false;
        };
        let at = expiry_instant(date);

        match self {
            ExpiryFilter::All => true,
            ExpiryFilter::Expired => at < now,
            ExpiryFilter::ExpiringSoon => {
                at >= now && at < now + Duration::days(EXPIRING_SOON_DAYS)
            }
            ExpiryFilter::Valid => at >= now,
        }
    }
}

impl FromStr for ExpiryFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(ExpiryFilter::All),
            "expired" => Ok(ExpiryFilter::Expired),
            "expiring-soon" => Ok(ExpiryFilter::ExpiringSoon),
            "valid" => Ok(ExpiryFilter::Valid),
            other => Err(DomainError::validation(format!(
                "expiry filter must be one of: all, expired, expiring-soon, valid (got '{other}')"
            ))),
        }
    }
}

/// Coarse expiry risk shown next to each row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryBadge {
    Unknown,
    Expired,
    ExpiringSoon,
    ExpiringLater,
    Ok,
}

impl ExpiryBadge {
    pub fn classify(expiry: Option<NaiveDate>, now: DateTime<Utc>) -> Self {
        let Some(date) = expiry else {
            return ExpiryBadge::Unknown;
        };
        let days = days_until_expiry(date, now);
        if days < 0 {
            ExpiryBadge::Expired
        } else if days <= EXPIRING_SOON_DAYS {
            ExpiryBadge::ExpiringSoon
        } else if days <= EXPIRING_LATER_DAYS {
            ExpiryBadge::ExpiringLater
        } else {
            ExpiryBadge::Ok
        }
    }

    /// Display colour used by front-ends.
    pub fn color(&self) -> &'static str {
        match self {
            ExpiryBadge::Unknown => "gray",
            ExpiryBadge::Expired => "red",
            ExpiryBadge::ExpiringSoon => "orange",
            ExpiryBadge::ExpiringLater => "yellow",
            ExpiryBadge::Ok => "emerald",
        }
    }
}
