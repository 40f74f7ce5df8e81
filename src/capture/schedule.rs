//! Wall-clock run alignment
//!
//! A capture run starts at a designated wall-clock minute so that
//! hour-bucket boundaries line up across restarts, and consecutive book
//! loops start with a fixed stagger.

use chrono::{DateTime, Timelike, Utc};
use std::time::Duration;

/// Time remaining until the next occurrence of the given wall-clock minute
///
/// Zero when the current minute already matches.
pub fn duration_until_minute(now: DateTime<Utc>, minute: u32) -> Duration {
    let minute = minute.min(59);
    if now.minute() == minute {
        return Duration::ZERO;
    }

    let delta = (i64::from(minute) - i64::from(now.minute())).rem_euclid(60);
    let target = now
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .map(|t| t + chrono::Duration::minutes(delta))
        .unwrap_or(now);

    (target - now).to_std().unwrap_or_default()
}

/// Sleep until the next occurrence of the given wall-clock minute
pub async fn align_to_minute(minute: u32) {
    let wait = duration_until_minute(Utc::now(), minute);
    if !wait.is_zero() {
        tracing::info!(minute, wait_secs = wait.as_secs(), "Waiting for aligned start");
        tokio::time::sleep(wait).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(time: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(time).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_already_on_the_minute() {
        let now = at("2022-05-12T15:00:30Z");
        assert_eq!(duration_until_minute(now, 0), Duration::ZERO);
    }

    #[test]
    fn test_waits_to_top_of_hour() {
        let now = at("2022-05-12T15:10:30Z");
        assert_eq!(
            duration_until_minute(now, 0),
            Duration::from_secs(49 * 60 + 30)
        );
    }

    #[test]
    fn test_waits_forward_within_the_hour() {
        let now = at("2022-05-12T15:10:00Z");
        assert_eq!(duration_until_minute(now, 30), Duration::from_secs(20 * 60));
    }

    #[test]
    fn test_sub_second_offsets_are_counted() {
        let now = at("2022-05-12T15:10:59.250Z");
        assert_eq!(
            duration_until_minute(now, 11),
            Duration::from_millis(750)
        );
    }

    #[test]
    fn test_out_of_range_minute_is_clamped() {
        let now = at("2022-05-12T15:59:00Z");
        assert_eq!(duration_until_minute(now, 75), Duration::ZERO);
    }
}
