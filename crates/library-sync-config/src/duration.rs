//! Human duration strings such as `"7d"`, `"6h"`, `"1.5 hours"` or `"500"`.
//!
//! A bare number is milliseconds. A year is 365.25 days.

use std::time::Duration;

const SECOND: f64 = 1_000.0;
const MINUTE: f64 = SECOND * 60.0;
const HOUR: f64 = MINUTE * 60.0;
const DAY: f64 = HOUR * 24.0;
const WEEK: f64 = DAY * 7.0;
const YEAR: f64 = DAY * 365.25;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,
    #[error("invalid duration '{0}'")]
    Invalid(String),
    #[error("unknown duration unit '{unit}' in '{input}'")]
    UnknownUnit { input: String, unit: String },
}

pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DurationError::Empty);
    }

    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);
    let value: f64 = number
        .parse()
        .map_err(|_| DurationError::Invalid(input.to_string()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(DurationError::Invalid(input.to_string()));
    }

    let unit = unit.trim().to_ascii_lowercase();
    let millis_per_unit = match unit.as_str() {
        "" | "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1.0,
        "s" | "sec" | "secs" | "second" | "seconds" => SECOND,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR,
        "d" | "day" | "days" => DAY,
        "w" | "week" | "weeks" => WEEK,
        "y" | "yr" | "yrs" | "year" | "years" => YEAR,
        _ => {
            return Err(DurationError::UnknownUnit {
                input: input.to_string(),
                unit,
            })
        }
    };

    Ok(Duration::from_millis((value * millis_per_unit).round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_units() {
        assert_eq!(parse_duration("45s").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(30 * 60));
        assert_eq!(parse_duration("6h").unwrap(), Duration::from_secs(6 * 3600));
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(7 * 86_400));
        assert_eq!(parse_duration("2w").unwrap(), Duration::from_secs(14 * 86_400));
    }

    #[test]
    fn test_bare_number_is_milliseconds() {
        assert_eq!(parse_duration("1500").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
    }

    #[test]
    fn test_long_units_and_fractions() {
        assert_eq!(parse_duration("1.5 hours").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration(" 2 Days ").unwrap(), Duration::from_secs(2 * 86_400));
        assert_eq!(parse_duration("1y").unwrap(), Duration::from_millis(31_557_600_000));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_duration(""), Err(DurationError::Empty));
        assert!(matches!(parse_duration("soon"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("-5m"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("3 fortnights"), Err(DurationError::UnknownUnit { .. })));
    }
}
