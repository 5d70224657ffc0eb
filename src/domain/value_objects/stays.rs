use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Nightly rate used when a property has no base rate.
pub const FALLBACK_BASE_RATE: f64 = 150.0;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
}

impl StayRange {
    /// Returns `None` unless `to_date` is strictly after `from_date`.
    pub fn new(from_date: DateTime<Utc>, to_date: DateTime<Utc>) -> Option<Self> {
        if to_date > from_date {
            Some(Self { from_date, to_date })
        } else {
            None
        }
    }

    /// Partial days count as a full night.
    pub fn nights(&self) -> i64 {
        let seconds = (self.to_date - self.from_date).num_seconds();
        let nights = seconds / SECONDS_PER_DAY + i64::from(seconds % SECONDS_PER_DAY != 0);
        nights.max(1)
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.from_date >= now
    }
}

pub fn effective_base_rate(base_rate: Option<f64>) -> f64 {
    match base_rate {
        Some(rate) if rate.is_finite() && rate > 0.0 => rate,
        _ => FALLBACK_BASE_RATE,
    }
}

pub fn stay_total(base_rate: Option<f64>, stay: &StayRange, multiplier: f64) -> f64 {
    effective_base_rate(base_rate) * stay.nights() as f64 * multiplier
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn three_night_stay_with_discount_package() {
        let stay = StayRange::new(utc(2025, 6, 1), utc(2025, 6, 4)).unwrap();

        assert_eq!(stay.nights(), 3);
        assert!((stay_total(Some(150.0), &stay, 0.9) - 405.0).abs() < 1e-9);
    }

    #[test]
    fn partial_days_round_up() {
        let from = utc(2025, 6, 1);
        let stay = StayRange::new(from, from + Duration::hours(25)).unwrap();

        assert_eq!(stay.nights(), 2);
    }

    #[test]
    fn short_stays_count_as_one_night() {
        let from = utc(2025, 6, 1);
        let stay = StayRange::new(from, from + Duration::hours(3)).unwrap();

        assert_eq!(stay.nights(), 1);
    }

    #[test]
    fn reversed_or_empty_ranges_are_rejected() {
        assert!(StayRange::new(utc(2025, 6, 4), utc(2025, 6, 1)).is_none());
        assert!(StayRange::new(utc(2025, 6, 4), utc(2025, 6, 4)).is_none());
    }

    #[test]
    fn missing_or_invalid_base_rate_falls_back() {
        let stay = StayRange::new(utc(2025, 6, 1), utc(2025, 6, 3)).unwrap();

        assert_eq!(stay_total(None, &stay, 1.0), 300.0);
        assert_eq!(stay_total(Some(f64::NAN), &stay, 1.0), 300.0);
        assert_eq!(stay_total(Some(0.0), &stay, 1.0), 300.0);
    }

    #[test]
    fn total_matches_formula_across_ranges() {
        let from = utc(2025, 1, 1);
        for hours in [1_i64, 23, 24, 47, 72, 24 * 30 + 5] {
            let stay = StayRange::new(from, from + Duration::hours(hours)).unwrap();
            let expected_nights = (hours as f64 / 24.0).ceil();

            assert_eq!(stay.nights() as f64, expected_nights);
            assert_eq!(stay_total(Some(200.0), &stay, 1.1), 200.0 * expected_nights * 1.1);
        }
    }
}
