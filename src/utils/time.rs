//! Wall-clock helpers

use chrono::{DateTime, Utc};

/// Seconds since the Unix epoch with microsecond resolution
pub fn unix_seconds() -> f64 {
    seconds_of(Utc::now())
}

/// Milliseconds since the Unix epoch with microsecond resolution
pub fn unix_millis() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000.0
}

/// Convert a timestamp to fractional seconds since the Unix epoch
pub fn seconds_of(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_agree() {
        let seconds = unix_seconds();
        let millis = unix_millis();
        assert!(millis / 1_000.0 >= seconds);
        assert!(millis / 1_000.0 - seconds < 1.0);
    }

    #[test]
    fn test_seconds_of_epoch_offset() {
        let at = DateTime::from_timestamp(1_000, 500_000_000).unwrap();
        assert_eq!(seconds_of(at), 1_000.5);
    }
}
