use chrono::{DateTime, Utc};

use crate::error::{BuildPulseError, Result};

/// Accepts an RFC3339 instant, a relative duration (`"5m"` means five minutes
/// ago) or integer epoch milliseconds.
pub fn parse_run_timestamp(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }

    if let Ok(millis) = input.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            BuildPulseError::InvalidArgument(format!("epoch millis out of range: {input}"))
        });
    }

    if let Ok(duration) = humantime::parse_duration(input) {
        return Ok(Utc::now()
            - chrono::Duration::from_std(duration).map_err(|e| {
                BuildPulseError::InvalidArgument(format!(
                    "failed to convert duration to chrono: {e}"
                ))
            })?);
    }

    Err(BuildPulseError::InvalidArgument(format!(
        "expected RFC3339 time, epoch millis or duration, got {input}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339() {
        let ts = parse_run_timestamp("2026-01-01T00:00:00Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn parses_epoch_millis() {
        let ts = parse_run_timestamp("1767225600000").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn parses_relative_duration() {
        let now = Utc::now();
        let ts = parse_run_timestamp("5m").unwrap();
        assert!(ts < now);
    }

    #[test]
    fn rejects_invalid() {
        assert!(parse_run_timestamp("nope").is_err());
    }
}
