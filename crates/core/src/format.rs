//! Locale-aware money formatting.

use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// ISO 4217 currency codes supported for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    BRL,
    USD,
    EUR,
}

impl CurrencyCode {
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::BRL => "R$",
            Self::USD => "$",
            Self::EUR => "€",
        }
    }
}

/// Display locale for numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Locale {
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "en-US")]
    EnUs,
}

impl Locale {
    const fn separators(self) -> (char, char) {
        match self {
            Self::PtBr => ('.', ','),
            Self::EnUs => (',', '.'),
        }
    }

    /// pt-BR puts a non-breaking space between symbol and digits.
    const fn symbol_gap(self) -> &'static str {
        match self {
            Self::PtBr => "\u{a0}",
            Self::EnUs => "",
        }
    }
}

/// Currency and locale used to render money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CurrencyFormat {
    pub currency: CurrencyCode,
    pub locale: Locale,
}

impl CurrencyFormat {
    #[must_use]
    pub const fn new(currency: CurrencyCode, locale: Locale) -> Self {
        Self { currency, locale }
    }

    /// Render an amount with two decimal places.
    ///
    /// ```
    /// use chairside_core::{CurrencyCode, CurrencyFormat, Locale, Money};
    ///
    /// let brl = CurrencyFormat::default();
    /// assert_eq!(brl.format(Money::from_cents(123_456)), "R$\u{a0}1.234,56");
    ///
    /// let usd = CurrencyFormat::new(CurrencyCode::USD, Locale::EnUs);
    /// assert_eq!(usd.format(Money::from_cents(-99)), "-$0.99");
    /// ```
    #[must_use]
    pub fn format(&self, value: Money) -> String {
        let mut rounded = value
            .amount()
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();

        let digits = rounded.abs().to_string();
        let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
        let (group, decimal) = self.locale.separators();

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(group);
            }
            grouped.push(digit);
        }

        format!(
            "{sign}{symbol}{gap}{grouped}{decimal}{cents}",
            sign = if negative { "-" } else { "" },
            symbol = self.currency.symbol(),
            gap = self.locale.symbol_gap(),
        )
    }
}

/// Format with the default BRL / pt-BR settings.
#[must_use]
pub fn format_currency(value: Money) -> String {
    CurrencyFormat::default().format(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_brl_pt_br() {
        assert_eq!(format_currency(Money::ZERO), "R$\u{a0}0,00");
        assert_eq!(format_currency(Money::from_major(2200)), "R$\u{a0}2.200,00");
        assert_eq!(
            format_currency(Money::from_cents(123_456_789)),
            "R$\u{a0}1.234.567,89"
        );
        assert_eq!(format_currency(Money::from_cents(-5050)), "-R$\u{a0}50,50");
    }

    #[test]
    fn test_en_us() {
        let usd = CurrencyFormat::new(CurrencyCode::USD, Locale::EnUs);
        assert_eq!(usd.format(Money::from_cents(100_000)), "$1,000.00");
        assert_eq!(usd.format(Money::from_cents(99_999)), "$999.99");
        let eur = CurrencyFormat::new(CurrencyCode::EUR, Locale::EnUs);
        assert_eq!(eur.format(Money::from_major(5)), "€5.00");
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        assert_eq!(format_currency(Money::new(Decimal::new(1005, 3))), "R$\u{a0}1,01");
        assert_eq!(format_currency(Money::new(Decimal::new(-1005, 3))), "-R$\u{a0}1,01");
        // Rounds to zero: no negative sign.
        assert_eq!(format_currency(Money::new(Decimal::new(-1, 3))), "R$\u{a0}0,00");
    }

    #[test]
    fn test_config_names() {
        let format: CurrencyFormat =
            serde_json::from_str(r#"{"currency":"USD","locale":"en-US"}"#).unwrap();
        assert_eq!(format, CurrencyFormat::new(CurrencyCode::USD, Locale::EnUs));
    }
}
