use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::quantity::time::Hours;

/// Fraction of the stored energy that survives self-discharge over one step.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Retention(pub f64);

impl Retention {
    pub const FULL: Self = Self(1.0);

    /// Compound the monthly self-discharge rate down to the step.
    ///
    /// The hourly factor depends on the number of hours in the step's own calendar month,
    /// so that a full month of idling loses exactly the monthly rate.
    pub fn for_step(monthly_self_discharge: f64, date: NaiveDate, duration: Hours) -> Self {
        if monthly_self_discharge <= 0.0 {
            return Self::FULL;
        }
        let hourly = (1.0 - monthly_self_discharge).powf(1.0 / hours_in_month(date));
        Self(hourly.powf(duration.0))
    }

    /// Energy lost by `energy` over the step.
    pub fn loss_of(self, energy: f64) -> f64 {
        energy * (1.0 - self.0)
    }
}

/// Number of calendar hours in the month containing the date.
pub fn hours_in_month(date: NaiveDate) -> f64 {
    let first = date.with_day(1).unwrap_or(date);
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    let days = next.map_or(31, |next| (next - first).num_days());
    #[expect(clippy::cast_precision_loss)]
    let hours = (days * 24) as f64;
    hours
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn month_lengths() {
        assert_abs_diff_eq!(hours_in_month(date(2025, 1, 15)), 744.0, epsilon = 1e-9);
        assert_abs_diff_eq!(hours_in_month(date(2025, 2, 1)), 672.0, epsilon = 1e-9);
        assert_abs_diff_eq!(hours_in_month(date(2024, 2, 29)), 696.0, epsilon = 1e-9);
        assert_abs_diff_eq!(hours_in_month(date(2025, 4, 30)), 720.0, epsilon = 1e-9);
        assert_abs_diff_eq!(hours_in_month(date(2025, 12, 31)), 744.0, epsilon = 1e-9);
    }

    #[test]
    fn no_self_discharge() {
        assert_eq!(Retention::for_step(0.0, date(2025, 3, 1), Hours(1.0)), Retention::FULL);
    }

    /// Idling through the whole month loses exactly the monthly rate.
    #[test]
    fn compounds_to_monthly_rate() {
        let retention = Retention::for_step(0.03, date(2025, 2, 10), Hours(1.0));
        assert_abs_diff_eq!(retention.0.powf(672.0), 0.97, epsilon = 1e-12);
    }

    #[test]
    fn depends_on_month() {
        let february = Retention::for_step(0.03, date(2025, 2, 10), Hours(1.0));
        let march = Retention::for_step(0.03, date(2025, 3, 10), Hours(1.0));
        assert!(february.0 < march.0);
    }

    #[test]
    fn scales_with_duration() {
        let hour = Retention::for_step(0.05, date(2025, 6, 1), Hours(1.0));
        let quarter = Retention::for_step(0.05, date(2025, 6, 1), Hours(0.25));
        assert_abs_diff_eq!(quarter.0.powf(4.0), hour.0, epsilon = 1e-12);
    }
}
