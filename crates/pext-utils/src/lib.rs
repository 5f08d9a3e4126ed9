//! Utility functions and helpers

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a decimal amount string, falling back to zero.
///
/// Amounts are carried around as strings ("120.50"); anything unparseable
/// counts as zero so a single bad record never poisons a sum.
pub fn parse_amount(s: &str) -> Decimal {
    Decimal::from_str(s.trim()).unwrap_or(Decimal::ZERO)
}

/// Mask an account number for display, keeping the last four digits
pub fn mask_account_number(number: &str) -> String {
    let len = number.chars().count();
    if len <= 4 {
        return number.to_string();
    }
    let tail: String = number.chars().skip(len - 4).collect();
    format!("{}{}", "*".repeat(len - 4), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("120.50"), Decimal::new(12050, 2));
        assert_eq!(parse_amount(" 30 "), Decimal::new(30, 0));
        assert_eq!(parse_amount("not-a-number"), Decimal::ZERO);
        assert_eq!(parse_amount(""), Decimal::ZERO);
    }

    #[test]
    fn test_mask_account_number() {
        assert_eq!(mask_account_number("1234567890"), "******7890");
        assert_eq!(mask_account_number("1234"), "1234");
        assert_eq!(mask_account_number("42"), "42");
    }
}
