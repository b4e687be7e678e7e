//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Format a Brazilian phone number as `(11) 99999-9999`.
///
/// Anything that is not 10 or 11 digits is shown as entered.
///
/// Usage in templates: `{{ vendor.phone|phone }}`
#[askama::filter_fn]
pub fn phone(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_phone(&value.to_string()))
}

fn format_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if !matches!(digits.len(), 10 | 11) {
        return raw.to_string();
    }
    let (area, number) = digits.split_at(2);
    let (head, tail) = number.split_at(number.len() - 4);
    format!("({area}) {head}-{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("11999990000"), "(11) 99999-0000");
        assert_eq!(format_phone("1133334444"), "(11) 3333-4444");
        assert_eq!(format_phone("(21) 98888-7777"), "(21) 98888-7777");
    }

    #[test]
    fn test_format_phone_keeps_unknown_shapes() {
        assert_eq!(format_phone(""), "");
        assert_eq!(format_phone("+55 11 99999 0000"), "+55 11 99999 0000");
    }
}
