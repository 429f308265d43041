//! Parsing of `XXhXXmXXs` duration strings, as reported by streaming platforms
//! for videos and clips.

use once_cell::sync::Lazy;
use regex::Regex;

static HOURS: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)h").unwrap());
static MINUTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)m").unwrap());
static SECONDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)s").unwrap());

/// Converts a duration string such as `"1h2m3s"` into seconds.
///
/// Every unit is optional and only the first occurrence of each unit counts,
/// so `"1h2h"` is one hour. Input with no recognised units yields `0`.
pub fn duration_to_secs(duration: &str) -> u64 {
    first_value(&HOURS, duration)
        .saturating_mul(3600)
        .saturating_add(first_value(&MINUTES, duration).saturating_mul(60))
        .saturating_add(first_value(&SECONDS, duration))
}

fn first_value(pattern: &Regex, input: &str) -> u64 {
    pattern
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|digits| digits.as_str().parse::<u64>().unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_and_partial_strings() {
        assert_eq!(duration_to_secs("1h2m3s"), 3723);
        assert_eq!(duration_to_secs("90s"), 90);
        assert_eq!(duration_to_secs("2h"), 7200);
        assert_eq!(duration_to_secs("15m"), 900);
        assert_eq!(duration_to_secs("3h0m59s"), 10859);
    }

    #[test]
    fn empty_and_garbage_yield_zero() {
        assert_eq!(duration_to_secs(""), 0);
        assert_eq!(duration_to_secs("soon"), 0);
        assert_eq!(duration_to_secs("h m s"), 0);
    }

    #[test]
    fn only_first_match_per_unit_counts() {
        assert_eq!(duration_to_secs("1h2h"), 3600);
        assert_eq!(duration_to_secs("5s10s"), 5);
    }

    #[test]
    fn unit_order_does_not_matter() {
        assert_eq!(duration_to_secs("3s2m1h"), 3723);
    }

    #[test]
    fn only_ascii_digits_count() {
        assert_eq!(duration_to_secs("\u{0661}h"), 0);
        assert_eq!(duration_to_secs("\u{0661}h5s"), 5);
    }

    #[test]
    fn huge_values_saturate() {
        assert_eq!(duration_to_secs("99999999999999999999999h"), u64::MAX);
    }
}
