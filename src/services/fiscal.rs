use chrono::{Datelike, NaiveDate};

use crate::models::PacingMetrics;

/// Fiscal years open on April 1st.
pub const FISCAL_YEAR_START_MONTH: u32 = 4;

/// Maps a calendar month to its fiscal quarter: Apr-Jun is 1, Jan-Mar is 4.
/// Out-of-range months fall into quarter 4.
pub fn fiscal_quarter(month: u32) -> u8 {
    match month {
        4..=6 => 1,
        7..=9 => 2,
        10..=12 => 3,
        _ => 4,
    }
}

/// First and last day of the fiscal year containing `today`.
pub fn fiscal_year_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start_year = if today.month() >= FISCAL_YEAR_START_MONTH {
        today.year()
    } else {
        today.year() - 1
    };
    // Both lookups only fail at the edges of chrono's representable range.
    let start = fiscal_year_start(start_year).unwrap_or(today);
    let end = fiscal_year_start(start_year + 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX);
    (start, end)
}

fn fiscal_year_start(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, FISCAL_YEAR_START_MONTH, 1)
}

/// `days_passed` counts today; `days_left` does not, so on April 1st it is 364
/// (365 in a leap fiscal year) and `daily_required` divides by that.
pub fn pacing(today: NaiveDate, annual_target: f64, total_achieved: f64) -> PacingMetrics {
    let (start, end) = fiscal_year_window(today);
    let days_passed = (today - start).num_days() + 1;
    let days_left = (end - today).num_days();
    let daily_required = if days_left > 0 {
        (annual_target - total_achieved) / days_left as f64
    } else {
        0.0
    };

    PacingMetrics {
        fiscal_year_start: start,
        fiscal_year_end: end,
        days_passed,
        days_left,
        daily_required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn quarter_boundaries() {
        assert_eq!(fiscal_quarter(4), 1);
        assert_eq!(fiscal_quarter(6), 1);
        assert_eq!(fiscal_quarter(7), 2);
        assert_eq!(fiscal_quarter(9), 2);
        assert_eq!(fiscal_quarter(10), 3);
        assert_eq!(fiscal_quarter(12), 3);
        assert_eq!(fiscal_quarter(1), 4);
        assert_eq!(fiscal_quarter(3), 4);
    }

    #[test]
    fn every_month_lands_in_a_quarter() {
        let mut counts = [0; 4];
        for month in 1..=12 {
            let q = fiscal_quarter(month);
            assert!((1..=4).contains(&q));
            counts[(q - 1) as usize] += 1;
        }
        assert_eq!(counts, [3, 3, 3, 3]);
    }

    #[test]
    fn window_after_april() {
        assert_eq!(
            fiscal_year_window(date(2024, 10, 17)),
            (date(2024, 4, 1), date(2025, 3, 31))
        );
        assert_eq!(
            fiscal_year_window(date(2024, 4, 1)),
            (date(2024, 4, 1), date(2025, 3, 31))
        );
    }

    #[test]
    fn window_before_april() {
        assert_eq!(
            fiscal_year_window(date(2025, 3, 31)),
            (date(2024, 4, 1), date(2025, 3, 31))
        );
        assert_eq!(
            fiscal_year_window(date(2025, 1, 1)),
            (date(2024, 4, 1), date(2025, 3, 31))
        );
    }

    #[test]
    fn pacing_on_first_day_of_fiscal_year() {
        let metrics = pacing(date(2025, 4, 1), 12_500_000.0, 0.0);
        assert_eq!(metrics.days_passed, 1);
        assert_eq!(metrics.days_left, 364);
        assert_eq!(metrics.days_passed + metrics.days_left, 365);
        assert_eq!(metrics.daily_required, 12_500_000.0 / 364.0);
    }

    #[test]
    fn pacing_spans_leap_day() {
        // FY 2023-24 contains 2024-02-29.
        let metrics = pacing(date(2023, 4, 1), 12_500_000.0, 0.0);
        assert_eq!(metrics.days_passed + metrics.days_left, 366);
    }

    #[test]
    fn pacing_on_last_day_guards_division() {
        let metrics = pacing(date(2025, 3, 31), 12_500_000.0, 1_000.0);
        assert_eq!(metrics.days_left, 0);
        assert_eq!(metrics.daily_required, 0.0);
        assert_eq!(metrics.days_passed, 365);
    }

    #[test]
    fn pacing_subtracts_achieved() {
        let metrics = pacing(date(2024, 10, 1), 1_000_000.0, 400_000.0);
        assert_eq!(metrics.days_left, 181);
        assert_eq!(metrics.daily_required, 600_000.0 / 181.0);
    }
}
