//! Lenient query-string parsing.
//!
//! Query parameters arrive as raw strings; values that do not parse are
//! treated as absent so the handler falls back to its documented default
//! instead of rejecting the request.

/// Parses a positive limit. Zero, negatives and garbage yield `None`.
pub fn parse_limit(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
}

/// Parses a positive window in minutes.
pub fn parse_minutes(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
}

/// Parses a boolean flag. Anything but a recognised truthy value is false.
pub fn parse_flag(raw: Option<&str>) -> bool {
    raw.is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        )
    })
}
