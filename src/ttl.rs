//! TTL Parser
//!
//! Converts human-readable durations such as `"30s"`, `"5m"`, `"2h"` or `"1d"`
//! into whole seconds. Every driver goes through [`parse_ttl`] so expiration
//! means the same thing regardless of backend.

use crate::error::{CacheError, Result};

// == Unit Multipliers ==
const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_DAY: u64 = 86_400;

// == Parse TTL ==
/// Parses an optional TTL string into seconds.
///
/// `None` means "never expires" and is passed through unchanged. Otherwise the
/// input must be a decimal magnitude followed by exactly one unit character
/// (`s`, `m`, `h` or `d`, case-insensitive).
///
/// # Errors
/// Returns [`CacheError::InvalidTtlFormat`] naming the input when the magnitude
/// is empty or non-numeric, the unit is unknown, or the result overflows.
pub fn parse_ttl(ttl: Option<&str>) -> Result<Option<u64>> {
    let Some(input) = ttl else {
        return Ok(None);
    };

    let invalid = || CacheError::InvalidTtlFormat(input.to_string());

    let (split, unit) = input.char_indices().last().ok_or_else(invalid)?;
    let magnitude = &input[..split];

    if magnitude.is_empty() || !magnitude.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let multiplier = match unit.to_ascii_lowercase() {
        's' => 1,
        'm' => SECONDS_PER_MINUTE,
        'h' => SECONDS_PER_HOUR,
        'd' => SECONDS_PER_DAY,
        _ => return Err(invalid()),
    };

    let seconds = magnitude
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(invalid)?;

    Ok(Some(seconds))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_ttl_never_expires() {
        assert_eq!(parse_ttl(None).unwrap(), None);
    }

    #[test]
    fn test_each_unit() {
        assert_eq!(parse_ttl(Some("10s")).unwrap(), Some(10));
        assert_eq!(parse_ttl(Some("5m")).unwrap(), Some(300));
        assert_eq!(parse_ttl(Some("2h")).unwrap(), Some(7_200));
        assert_eq!(parse_ttl(Some("1d")).unwrap(), Some(86_400));
    }

    #[test]
    fn test_unit_is_case_insensitive() {
        assert_eq!(parse_ttl(Some("3M")).unwrap(), Some(180));
        assert_eq!(parse_ttl(Some("1D")).unwrap(), Some(86_400));
    }

    #[test]
    fn test_zero_magnitude_is_allowed() {
        assert_eq!(parse_ttl(Some("0s")).unwrap(), Some(0));
    }

    #[test]
    fn test_rejects_malformed_input() {
        for bad in ["", "s", "10", "10x", "1.5h", "-5s", "+5s", " 5s", "5 s", "ten", "5ss", "5é"] {
            match parse_ttl(Some(bad)) {
                Err(CacheError::InvalidTtlFormat(input)) => assert_eq!(input, bad),
                other => panic!("expected InvalidTtlFormat for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_rejects_overflow() {
        let huge = format!("{}d", u64::MAX);
        assert!(matches!(
            parse_ttl(Some(&huge)),
            Err(CacheError::InvalidTtlFormat(_))
        ));
    }
}
