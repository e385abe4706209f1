//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time as milliseconds since the Unix epoch
///
/// Cache entry lifetimes are bookkept in epoch millis.
pub fn epoch_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
    }

    #[test]
    fn test_epoch_millis_matches_now() {
        let millis = epoch_millis();
        let seconds = now().timestamp();
        // Within a second of each other
        assert!((millis / 1000 - seconds).abs() <= 1);
    }

    #[tokio::test]
    async fn test_epoch_millis_advances() {
        let first = epoch_millis();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = epoch_millis();
        assert!(second > first);
    }

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(0), Duration::from_millis(0));
        assert_eq!(millis_to_duration(1000), Duration::from_secs(1));
    }
}
