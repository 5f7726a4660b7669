use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Expiry risk tier of a medicine batch.
///
/// Ordering follows urgency: `Expired < Critical < Warning < Safe`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Expired,
    Critical,
    Warning,
    Safe,
}

/// A batch expiring within this many days needs immediate action.
pub const CRITICAL_WINDOW_DAYS: i64 = 30;

/// A batch expiring within this many days should be watched.
pub const WARNING_WINDOW_DAYS: i64 = 60;

/// Days until expiry, negative once past it.
pub fn days_remaining(expiry: NaiveDate, today: NaiveDate) -> i64 {
    expiry.signed_duration_since(today).num_days()
}

/// Classify an expiry date relative to `today`.
pub fn classify(expiry: NaiveDate, today: NaiveDate) -> RiskTier {
    match days_remaining(expiry, today) {
        d if d < 0 => RiskTier::Expired,
        d if d <= CRITICAL_WINDOW_DAYS => RiskTier::Critical,
        d if d <= WARNING_WINDOW_DAYS => RiskTier::Warning,
        _ => RiskTier::Safe,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn in_days(days: i64) -> NaiveDate {
        if days >= 0 {
            today().checked_add_days(Days::new(days as u64)).unwrap()
        } else {
            today().checked_sub_days(Days::new(-days as u64)).unwrap()
        }
    }

    #[test]
    fn boundaries_at_zero_thirty_and_sixty_days() {
        assert_eq!(classify(in_days(-1), today()), RiskTier::Expired);
        assert_eq!(classify(in_days(0), today()), RiskTier::Critical);
        assert_eq!(classify(in_days(30), today()), RiskTier::Critical);
        assert_eq!(classify(in_days(31), today()), RiskTier::Warning);
        assert_eq!(classify(in_days(60), today()), RiskTier::Warning);
        assert_eq!(classify(in_days(61), today()), RiskTier::Safe);
    }

    #[test]
    fn representative_examples() {
        assert_eq!(classify(in_days(15), today()), RiskTier::Critical);
        assert_eq!(classify(in_days(45), today()), RiskTier::Warning);
        assert_eq!(classify(in_days(90), today()), RiskTier::Safe);
        assert_eq!(classify(in_days(-1), today()), RiskTier::Expired);
    }

    #[test]
    fn tier_is_monotonic_in_days_remaining() {
        let mut previous = classify(in_days(-120), today());
        for d in -119..=120 {
            let tier = classify(in_days(d), today());
            assert!(tier >= previous, "tier regressed at {} days", d);
            previous = tier;
        }
    }

    #[test]
    fn tiers_serialize_uppercase() {
        assert_eq!(serde_json::to_string(&RiskTier::Critical).unwrap(), "\"CRITICAL\"");
        assert_eq!(serde_json::to_string(&RiskTier::Safe).unwrap(), "\"SAFE\"");
    }
}
