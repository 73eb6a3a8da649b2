//! Scalar coercions shared by the parser and the compiler.

use regex::Regex;
use serde_json::Number;
use std::sync::OnceLock;

fn timestamp_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^(\d\d):(\d\d):(\d\d)$").expect("timestamp regex must compile"))
}

/// Convert an `HH:MM:SS` timestamp into seconds
///
/// Anything that is not exactly three two-digit groups yields `None`, never zero.
pub fn timestamp_to_seconds(timestamp: &str) -> Option<u64> {
    let captures = timestamp_regex().captures(timestamp)?;

    let mut seconds = 0;
    for (group, multiplier) in [3600, 60, 1].into_iter().enumerate() {
        seconds += captures[group + 1].parse::<u64>().ok()? * multiplier;
    }

    Some(seconds)
}

/// Format seconds as an `HH:MM:SS` timestamp; hours are not capped at two digits
pub fn seconds_to_timestamp(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        seconds / 60 % 60,
        seconds % 60
    )
}

/// Coerce an attribute into a number, leaving it unset when it does not parse
///
/// Integral values stay integers; anything else that parses becomes a finite float.
pub fn numberify(value: Option<&str>) -> Option<Number> {
    let value = value?.trim();

    if let Ok(integer) = value.parse::<i64>() {
        return Some(integer.into());
    }
    if let Ok(integer) = value.parse::<u64>() {
        return Some(integer.into());
    }

    let float = value.parse::<f64>().ok()?;
    if float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
        return Some((float as i64).into());
    }
    Number::from_f64(float)
}

/// Whole seconds of a numeric duration, flooring fractions; negative values yield `None`
pub fn whole_seconds(number: &Number) -> Option<u64> {
    number.as_u64().or_else(|| {
        number
            .as_f64()
            .filter(|seconds| *seconds >= 0.0 && seconds.is_finite())
            .map(|seconds| seconds.floor() as u64)
    })
}

/// Coerce a case-insensitive "true"/"false" attribute into a boolean
pub fn string_to_boolean(value: Option<&str>) -> Option<bool> {
    let value = value?;

    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
