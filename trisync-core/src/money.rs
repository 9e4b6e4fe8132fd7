//! Money and date parsers for the bank's Dutch locale formats.

use chrono::NaiveDate;

/// Bank amounts carry two decimals; the budgeting API counts thousandths.
pub const MILLIUNIT_SCALE: u64 = 10;

/// Parse a bank amount like `1.234,56` into milliunits.
///
/// Every non-digit is dropped, so the two decimals are already folded into
/// the digit string and the sign is discarded. Empty input is `None`; input
/// without any digit is `Some(0)`.
pub fn parse_amount(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }

    let cents = text
        .chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0u64, |acc, d| acc.saturating_mul(10).saturating_add(u64::from(d)));

    Some(cents.saturating_mul(MILLIUNIT_SCALE))
}

/// Parse a `DD-MM-YYYY` date as shown in the portal and in exports.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%d-%m-%Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_dutch_format() {
        assert_eq!(parse_amount("1.234,56"), Some(1_234_560));
        assert_eq!(parse_amount("150,00"), Some(150_000));
        assert_eq!(parse_amount("0,05"), Some(50));
    }

    #[test]
    fn test_parse_amount_drops_sign() {
        assert_eq!(parse_amount("-12,50"), Some(12_500));
        assert_eq!(parse_amount("+12,50"), parse_amount("-12,50"));
    }

    #[test]
    fn test_parse_amount_empty_vs_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), Some(0));
        assert_eq!(parse_amount(" "), Some(0));
    }

    #[test]
    fn test_parse_amount_saturates() {
        let huge = "9".repeat(40);
        assert_eq!(parse_amount(&huge), Some(u64::MAX));
        assert_eq!(parse_amount("18.446.744.073.709.551,61"), Some(18_446_744_073_709_551_610));
        assert_eq!(parse_amount("18.446.744.073.709.551,62"), Some(u64::MAX));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("01-03-2020"), NaiveDate::from_ymd_opt(2020, 3, 1));
        assert_eq!(parse_date(" 31-12-2019 "), NaiveDate::from_ymd_opt(2019, 12, 31));
        assert_eq!(parse_date("2020-03-01"), None);
        assert_eq!(parse_date("31-02-2020"), None);
    }
}
