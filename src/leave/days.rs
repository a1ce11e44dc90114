use chrono::NaiveDate;

use crate::leave::LeaveError;

/// Inclusive calendar-day span between two naive dates.
///
/// `start == end` counts as 1 day. `end < start` is a validation error,
/// never a negative count. No timezone handling; these are plain dates.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> Result<i64, LeaveError> {
    if end < start {
        return Err(LeaveError::EndBeforeStart);
    }
    Ok((end - start).num_days() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn same_day_counts_as_one() {
        assert_eq!(inclusive_days(d("2024-01-10"), d("2024-01-10")).unwrap(), 1);
    }

    #[test]
    fn span_is_inclusive_on_both_ends() {
        assert_eq!(inclusive_days(d("2026-01-01"), d("2026-01-03")).unwrap(), 3);
        assert_eq!(inclusive_days(d("2026-02-27"), d("2026-03-02")).unwrap(), 4);
    }

    #[test]
    fn end_before_start_is_an_error() {
        assert!(matches!(
            inclusive_days(d("2026-01-05"), d("2026-01-04")),
            Err(LeaveError::EndBeforeStart)
        ));
    }

    #[test]
    fn span_is_at_least_one_day() {
        let start = d("2025-12-28");
        for offset in 0..10 {
            let end = start + chrono::Duration::days(offset);
            let days = inclusive_days(start, end).unwrap();
            assert_eq!(days, offset + 1);
            assert!(days >= 1);
        }
    }
}
