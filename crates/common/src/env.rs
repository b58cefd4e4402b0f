//! Environment variable parsing

use std::time::Duration;

/// Step/hook timeout when `DEFAULT_TIMEOUT` is unset or unusable
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Read a variable, treating non-UTF-8 values as unset.
pub fn var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// `true|1|yes` and `false|0|no`, case-insensitive; anything else is `default`.
pub fn parse_boolean_env(raw: Option<&str>, default: bool) -> bool {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true") | Some("1") | Some("yes") => true,
        Some("false") | Some("0") | Some("no") => false,
        _ => default,
    }
}

/// Trimmed value; blank counts as unset.
pub fn parse_string_env(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Resolve `DEFAULT_TIMEOUT`.
///
/// Values below 1000 are seconds, larger ones milliseconds. Missing,
/// non-numeric and non-positive values fall back to [`DEFAULT_TIMEOUT`].
pub fn resolve_timeout(raw: Option<&str>) -> Duration {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return DEFAULT_TIMEOUT;
    };
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => {
            if n < 1000.0 {
                Duration::from_secs_f64(n)
            } else {
                Duration::from_millis(n as u64)
            }
        }
        _ => DEFAULT_TIMEOUT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Some("true"), false, true; "true")]
    #[test_case(Some(" YES "), false, true; "yes padded")]
    #[test_case(Some("1"), false, true; "one")]
    #[test_case(Some("No"), true, false; "no")]
    #[test_case(Some("0"), true, false; "zero")]
    #[test_case(Some("maybe"), true, true; "unknown keeps default")]
    #[test_case(None, false, false; "unset keeps default")]
    fn test_parse_boolean_env(raw: Option<&str>, default: bool, expected: bool) {
        assert_eq!(parse_boolean_env(raw, default), expected);
    }

    #[test]
    fn test_parse_string_env() {
        assert_eq!(parse_string_env(Some("  firefox ")), Some("firefox".to_string()));
        assert_eq!(parse_string_env(Some("   ")), None);
        assert_eq!(parse_string_env(None), None);
    }

    #[test_case(None, 60_000; "unset")]
    #[test_case(Some(""), 60_000; "empty")]
    #[test_case(Some("abc"), 60_000; "not a number")]
    #[test_case(Some("-5"), 60_000; "negative")]
    #[test_case(Some("0"), 60_000; "zero")]
    #[test_case(Some("30"), 30_000; "seconds")]
    #[test_case(Some("2.5"), 2_500; "fractional seconds")]
    #[test_case(Some("1000"), 1_000; "milliseconds boundary")]
    #[test_case(Some("90000"), 90_000; "milliseconds")]
    fn test_resolve_timeout(raw: Option<&str>, expected_ms: u128) {
        assert_eq!(resolve_timeout(raw).as_millis(), expected_ms);
    }
}
