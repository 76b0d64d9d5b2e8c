//! Currency codes, display formatting, and the exchange-rate provider chain.

pub mod http;
pub mod rates;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use http::{HttpRateSource, RatePayload, RateSourceConfig};
pub use rates::{RateError, RateOrigin, RateProvider, RateQuote, RateSource};

/// ISO 4217 currency representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("USD")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Prefix symbol for codes that conventionally lead the number.
pub fn symbol_for(code: &str) -> Option<&'static str> {
    match code {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        _ => None,
    }
}

/// Formats `value` with `precision` decimals and `,` thousands grouping.
pub fn format_number(value: f64, precision: u8) -> String {
    let body = format!("{:.*}", precision as usize, value.abs());
    let (int_part, frac_part) = match body.find('.') {
        Some(pos) => body.split_at(pos),
        None => (body.as_str(), ""),
    };
    let grouped = group_digits(int_part, ',');
    let sign = if value < 0.0 && body.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    format!("{}{}{}", sign, grouped, frac_part)
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::new();
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, separator);
        }
        grouped.insert(0, ch);
    }
    grouped
}

/// Renders a whole-unit amount, e.g. `$1,000` or `12,650,000 UZS`.
pub fn format_amount(amount: u64, code: &CurrencyCode) -> String {
    format_currency_value(amount as f64, code, 0)
}

pub fn format_currency_value(amount: f64, code: &CurrencyCode, precision: u8) -> String {
    let body = format_number(amount, precision);
    match symbol_for(code.as_str()) {
        Some(symbol) if body.starts_with('-') => format!("-{}{}", symbol, &body[1..]),
        Some(symbol) => format!("{}{}", symbol, body),
        None => format!("{} {}", body, code.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(-1000.0, 0), "-1,000");
        assert_eq!(format_number(0.0, 0), "0");
    }

    #[test]
    fn formats_amounts_with_symbol_or_code() {
        assert_eq!(format_amount(80_000, &CurrencyCode::new("usd")), "$80,000");
        assert_eq!(
            format_amount(12_650_000, &CurrencyCode::new("UZS")),
            "12,650,000 UZS"
        );
        assert_eq!(
            format_currency_value(-12.5, &CurrencyCode::new("EUR"), 2),
            "-€12.50"
        );
    }
}
