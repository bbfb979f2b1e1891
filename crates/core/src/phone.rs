//! Phone number normalisation for SMS delivery.
//!
//! Brevo expects recipients as digits only, country code first and no
//! leading `+` or `00`. Customers type French numbers in many shapes
//! (`06 12 34 56 78`, `06.12.34.56.78`, `+33 6 12 34 56 78`), so every
//! number goes through [`normalize_phone`] before it is stored or used.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Country code used for national (leading `0`) numbers.
pub const DEFAULT_COUNTRY_CODE: &str = "33";

/// Separators customers commonly type between digit groups.
static SEPARATORS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s.\-()/]").expect("valid regex"));

/// National French number: `0` followed by nine digits, first not `0`.
static NATIONAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0([1-9]\d{8})$").expect("valid regex"));

/// International number after stripping `+` / `00`: 8 to 15 digits.
static INTERNATIONAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9]\d{7,14}$").expect("valid regex"));

/// Normalise `raw` to Brevo's digits-only international form.
pub fn normalize_phone(raw: &str) -> Result<String, CoreError> {
    let compact = SEPARATORS_RE.replace_all(raw.trim(), "");

    if let Some(caps) = NATIONAL_RE.captures(&compact) {
        return Ok(format!("{DEFAULT_COUNTRY_CODE}{}", &caps[1]));
    }

    let international = compact
        .strip_prefix('+')
        .or_else(|| compact.strip_prefix("00"));

    if let Some(digits) = international {
        // "+33 06..." is a frequent typo: drop the trunk zero.
        let digits = match digits.strip_prefix(DEFAULT_COUNTRY_CODE) {
            Some(rest) if rest.starts_with('0') => {
                format!("{DEFAULT_COUNTRY_CODE}{}", &rest[1..])
            }
            _ => digits.to_string(),
        };
        if INTERNATIONAL_RE.is_match(&digits) {
            return Ok(digits);
        }
    }

    Err(CoreError::Validation(format!("Invalid phone number '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn national_number_with_spaces() {
        assert_eq!(normalize_phone("06 12 34 56 78").unwrap(), "33612345678");
    }

    #[test]
    fn national_number_with_dots() {
        assert_eq!(normalize_phone("07.98.76.54.32").unwrap(), "33798765432");
    }

    #[test]
    fn international_plus_prefix() {
        assert_eq!(normalize_phone("+33 6 12 34 56 78").unwrap(), "33612345678");
    }

    #[test]
    fn international_double_zero_prefix() {
        assert_eq!(normalize_phone("0033612345678").unwrap(), "33612345678");
    }

    #[test]
    fn trunk_zero_after_country_code_is_dropped() {
        assert_eq!(normalize_phone("+33 (0)6 12 34 56 78").unwrap(), "33612345678");
    }

    #[test]
    fn foreign_numbers_are_kept() {
        assert_eq!(normalize_phone("+32 470 12 34 56").unwrap(), "32470123456");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(normalize_phone("").is_err());
        assert!(normalize_phone("12345").is_err());
        assert!(normalize_phone("06 12 34").is_err());
        assert!(normalize_phone("not a phone").is_err());
    }
}
