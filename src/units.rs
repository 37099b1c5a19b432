//! Conversion between raw integer base units and human-readable decimal amounts.
//!
//! Wallet and invoice endpoints exchange amounts as integer strings in the asset's smallest
//! unit (e.g. `"1500000"` with 6 decimals is `1.5`). These helpers work on strings so that
//! values larger than any fixed-width integer survive the conversion untouched.

use std::str::FromStr as _;

use crate::Result;
use crate::error::Error;
use crate::types::Decimal;

/// Converts a raw base-unit integer string into a trimmed decimal string.
///
/// ```
/// use exchange_client_sdk::units::format_units;
///
/// assert_eq!(format_units("1500000", 6).unwrap(), "1.5");
/// assert_eq!(format_units("42", 0).unwrap(), "42");
/// assert_eq!(format_units("-5", 2).unwrap(), "-0.05");
/// ```
pub fn format_units(raw: &str, decimals: u32) -> Result<String> {
    let (negative, digits) = split_sign(raw.trim());
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::validation(format!(
            "raw amount must be an integer, got {raw:?}"
        )));
    }

    let digits = digits.trim_start_matches('0');
    let decimals = decimals as usize;

    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');

    let mut formatted = String::with_capacity(padded.len() + 2);
    if negative && (whole != "0" || !fraction.is_empty()) {
        formatted.push('-');
    }
    formatted.push_str(whole);
    if !fraction.is_empty() {
        formatted.push('.');
        formatted.push_str(fraction);
    }

    Ok(formatted)
}

/// Converts a decimal amount string into its raw base-unit integer string.
///
/// Fails if `amount` carries more fractional digits than `decimals`, since that value cannot
/// be represented on-chain.
///
/// ```
/// use exchange_client_sdk::units::parse_units;
///
/// assert_eq!(parse_units("1.5", 6).unwrap(), "1500000");
/// assert_eq!(parse_units("0.000001", 6).unwrap(), "1");
/// assert!(parse_units("0.0000001", 6).is_err());
/// ```
pub fn parse_units(amount: &str, decimals: u32) -> Result<String> {
    let (negative, unsigned) = split_sign(amount.trim());
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(Error::validation(format!(
            "amount must be a decimal number, got {amount:?}"
        )));
    }

    let decimals = decimals as usize;
    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > decimals {
        return Err(Error::validation(format!(
            "amount {amount} has more than {decimals} fractional digits"
        )));
    }

    let mut raw = String::with_capacity(whole.len() + decimals + 1);
    raw.push_str(whole);
    raw.push_str(fraction);
    raw.extend(std::iter::repeat_n('0', decimals - fraction.len()));

    let raw = raw.trim_start_matches('0');
    Ok(match (raw.is_empty(), negative) {
        (true, _) => "0".to_owned(),
        (false, true) => format!("-{raw}"),
        (false, false) => raw.to_owned(),
    })
}

/// Converts a raw base-unit integer string into a [`Decimal`].
pub fn to_decimal(raw: &str, decimals: u32) -> Result<Decimal> {
    Ok(Decimal::from_str(&format_units(raw, decimals)?)?)
}

/// Converts a [`Decimal`] into its raw base-unit integer string.
pub fn from_decimal(amount: Decimal, decimals: u32) -> Result<String> {
    parse_units(&amount.normalize().to_string(), decimals)
}

fn split_sign(value: &str) -> (bool, &str) {
    match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn format_units_should_trim_zeros() {
        assert_eq!(format_units("1000000", 6).unwrap(), "1");
        assert_eq!(format_units("1230000", 6).unwrap(), "1.23");
        assert_eq!(format_units("000123", 6).unwrap(), "0.000123");
        assert_eq!(format_units("0", 6).unwrap(), "0");
        assert_eq!(format_units("-0", 6).unwrap(), "0");
    }

    #[test]
    fn format_units_should_handle_values_beyond_u128() {
        let raw = "1234567890123456789012345678901234567890123";
        assert_eq!(
            format_units(raw, 18).unwrap(),
            "1234567890123456789012345.678901234567890123"
        );
    }

    #[test]
    fn format_units_should_reject_non_integers() {
        assert!(format_units("1.5", 6).is_err());
        assert!(format_units("", 6).is_err());
        assert!(format_units("abc", 6).is_err());
        assert!(format_units("-", 6).is_err());
    }

    #[test]
    fn parse_units_should_scale_amounts() {
        assert_eq!(parse_units("1", 6).unwrap(), "1000000");
        assert_eq!(parse_units("0.5", 6).unwrap(), "500000");
        assert_eq!(parse_units(".5", 2).unwrap(), "50");
        assert_eq!(parse_units("12.3400", 3).unwrap(), "12340");
        assert_eq!(parse_units("0.000", 3).unwrap(), "0");
        assert_eq!(parse_units("-2.5", 1).unwrap(), "-25");
        assert_eq!(parse_units("7", 0).unwrap(), "7");
    }

    #[test]
    fn parse_units_should_reject_excess_precision() {
        let err = parse_units("1.23", 1).unwrap_err();
        assert_eq!(err.kind(), crate::error::Kind::Validation);
        assert!(parse_units("1.2.3", 6).is_err());
        assert!(parse_units(".", 6).is_err());
        assert!(parse_units("1e5", 6).is_err());
    }

    #[test]
    fn decimal_helpers_should_agree_with_string_helpers() {
        assert_eq!(to_decimal("2500000", 6).unwrap(), dec!(2.5));
        assert_eq!(from_decimal(dec!(2.500), 6).unwrap(), "2500000");
    }
}
