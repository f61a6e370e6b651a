use std::collections::BTreeSet;

use chrono::NaiveDate;

/// Consecutive calendar days, ending today, with at least one completed session.
///
/// Dates are deduplicated and walked most-recent-first. The newest date must be
/// `today` and every following date exactly one day earlier than the last accepted
/// one; the walk stops at the first mismatch.
pub fn current_streak<I>(session_dates: I, today: NaiveDate) -> i32
where
    I: IntoIterator<Item = NaiveDate>,
{
    let distinct: BTreeSet<NaiveDate> = session_dates.into_iter().collect();

    let mut streak = 0;
    let mut expected = today;

    for date in distinct.iter().rev() {
        if *date != expected {
            break;
        }
        streak += 1;
        match expected.pred_opt() {
            Some(previous_day) => expected = previous_day,
            None => break,
        }
    }

    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    fn days_ago(n: u64) -> NaiveDate {
        today().checked_sub_days(Days::new(n)).unwrap()
    }

    #[test]
    fn test_three_consecutive_days_ending_today() {
        let dates = vec![days_ago(0), days_ago(1), days_ago(2)];
        assert_eq!(current_streak(dates, today()), 3);
    }

    #[test]
    fn test_no_session_today_means_no_streak() {
        let dates = vec![days_ago(1), days_ago(3)];
        assert_eq!(current_streak(dates, today()), 0);

        let dates = vec![days_ago(1), days_ago(2), days_ago(3)];
        assert_eq!(current_streak(dates, today()), 0);
    }

    #[test]
    fn test_gap_stops_the_walk() {
        let dates = vec![days_ago(0), days_ago(1), days_ago(3), days_ago(4)];
        assert_eq!(current_streak(dates, today()), 2);
    }

    #[test]
    fn test_same_day_sessions_count_once() {
        let dates = vec![days_ago(0), days_ago(0), days_ago(1), days_ago(1), days_ago(1)];
        assert_eq!(current_streak(dates, today()), 2);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let dates = vec![days_ago(2), days_ago(0), days_ago(1)];
        assert_eq!(current_streak(dates, today()), 3);
    }

    #[test]
    fn test_future_dated_session_blocks_the_walk() {
        let tomorrow = today().succ_opt().unwrap();
        let dates = vec![tomorrow, days_ago(0), days_ago(1)];
        assert_eq!(current_streak(dates, today()), 0);
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(current_streak(Vec::new(), today()), 0);
    }
}
