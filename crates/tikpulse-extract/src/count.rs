//! Human-formatted counter parsing (`"12.3K"`, `"4,5M"`, `"1 234"`).

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// `<number><optional suffix>` where the number may carry `.`/`,`/space
/// separators. The number group is lazy so the suffix is never swallowed.
static COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([\d.,\s]+?)\s*([KMB])?$").expect("valid count regex"));

/// `1,234` / `1.234.567` / `1 234`: groups of exactly three digits.
static GROUPED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}(?:[.,\s]\d{3})+$").expect("valid grouping regex"));

/// Parse a human-formatted count string into a non-negative integer.
///
/// - Non-breaking spaces are treated as spaces and the input is trimmed.
/// - With a `K`/`M`/`B` suffix (any case) a comma is a decimal point:
///   `"4,5M"` is 4 500 000, `"12.3K"` is 12 300.
/// - Without a suffix, digit groups of three separated by `,`, `.` or a
///   space are thousands separators: `"1,234"` and `"1 234"` are 1 234.
/// - Anything else falls back to keeping only the digits; if none remain
///   the result is 0.
///
/// Never panics; every malformed input degrades to 0.
#[must_use]
pub fn parse_count(input: &str) -> u64 {
    let normalized = input.replace('\u{a0}', " ");
    let s = normalized.trim();
    if s.is_empty() {
        return 0;
    }

    if let Some(caps) = COUNT_RE.captures(s) {
        let number = caps.get(1).map_or("", |m| m.as_str()).trim();
        let suffix = caps.get(2).map(|m| m.as_str().to_ascii_uppercase());

        let parsed = match suffix.as_deref() {
            Some(suf) => parse_decimal(number).map(|n| n * multiplier(suf)),
            None if GROUPED_RE.is_match(number) => {
                let digits: String = number.chars().filter(char::is_ascii_digit).collect();
                digits.parse::<f64>().ok()
            }
            None => parse_decimal(number),
        };

        if let Some(value) = parsed {
            return float_to_count(value);
        }
    }

    strip_to_digits(s)
}

/// Parse a JSON counter that may be `null`, a number, or a formatted string.
///
/// Negative and non-finite numbers clamp to 0; fractional numbers round.
#[must_use]
pub fn parse_count_value(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(float_to_count))
            .unwrap_or(0),
        Value::String(s) => parse_count(s),
        _ => 0,
    }
}

fn multiplier(suffix: &str) -> f64 {
    match suffix {
        "K" => 1_000.0,
        "M" => 1_000_000.0,
        "B" => 1_000_000_000.0,
        _ => 1.0,
    }
}

/// Parse `"4,5"` / `"12.3"` / `"1 2"` as a decimal, comma meaning period.
fn parse_decimal(number: &str) -> Option<f64> {
    let cleaned: String = number
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn float_to_count(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    // `as` saturates at u64::MAX for out-of-range floats.
    value.round() as u64
}

fn strip_to_digits(s: &str) -> u64 {
    let digits: String = s.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<u64>().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn suffix_k_with_decimal_point() {
        assert_eq!(parse_count("12.3K"), 12_300);
    }

    #[test]
    fn suffix_m_with_decimal_comma() {
        assert_eq!(parse_count("4,5M"), 4_500_000);
    }

    #[test]
    fn suffix_is_case_insensitive_and_may_be_spaced() {
        assert_eq!(parse_count("1.2 m"), 1_200_000);
        assert_eq!(parse_count("3b"), 3_000_000_000);
    }

    #[test]
    fn comma_thousands_separator() {
        assert_eq!(parse_count("1,234"), 1_234);
        assert_eq!(parse_count("1,234,567"), 1_234_567);
    }

    #[test]
    fn space_and_nbsp_thousands_separator() {
        assert_eq!(parse_count("1 234"), 1_234);
        assert_eq!(parse_count("1\u{a0}234\u{a0}567"), 1_234_567);
    }

    #[test]
    fn plain_integer_and_surrounding_whitespace() {
        assert_eq!(parse_count("  987  "), 987);
    }

    #[test]
    fn fractional_without_suffix_rounds() {
        assert_eq!(parse_count("12.6"), 13);
    }

    #[test]
    fn garbage_returns_zero() {
        assert_eq!(parse_count("abc"), 0);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("K"), 0);
        assert_eq!(parse_count("..."), 0);
    }

    #[test]
    fn text_with_embedded_digits_falls_back_to_stripping() {
        assert_eq!(parse_count("1,2,3 views"), 123);
    }

    #[test]
    fn overflowing_digit_run_returns_zero() {
        assert_eq!(parse_count("views: 99999999999999999999999999"), 0);
    }

    #[test]
    fn value_null_and_other_types_are_zero() {
        assert_eq!(parse_count_value(&Value::Null), 0);
        assert_eq!(parse_count_value(&json!(true)), 0);
        assert_eq!(parse_count_value(&json!({"a": 1})), 0);
    }

    #[test]
    fn value_numbers_pass_through() {
        assert_eq!(parse_count_value(&json!(42)), 42);
        assert_eq!(parse_count_value(&json!(41.6)), 42);
        assert_eq!(parse_count_value(&json!(-5)), 0);
    }

    #[test]
    fn value_strings_use_text_rules() {
        assert_eq!(parse_count_value(&json!("1.5K")), 1_500);
        assert_eq!(parse_count_value(&json!("120")), 120);
    }
}
