//! Presentation helpers layered on top of the engine's numeric values.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::financials_model::{FieldDomain, FinancialField};
use crate::constants::DISPLAY_DECIMAL_PRECISION;
use crate::utils::decimal_utils::round_to_cents;

/// How a field value should be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    pub currency_symbol: String,
    pub mask_commissions: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            currency_symbol: crate::constants::DEFAULT_CURRENCY_SYMBOL.to_string(),
            mask_commissions: false,
        }
    }
}

/// Formats `value` as e.g. `$1,234,567.89`; negatives render as `-$12.50`.
pub fn format_currency(value: Decimal, symbol: &str) -> String {
    let mut rounded = round_to_cents(value).abs();
    rounded.rescale(DISPLAY_DECIMAL_PRECISION);
    let plain = rounded.to_string();
    let (whole, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let sign = if value < Decimal::ZERO && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{}{}.{}", sign, symbol, group_thousands(whole), fraction)
}

/// Formats a percentage with two decimals, e.g. `2.50%`.
pub fn format_percentage(value: Decimal) -> String {
    let mut rounded = value.round_dp(DISPLAY_DECIMAL_PRECISION);
    rounded.rescale(DISPLAY_DECIMAL_PRECISION);
    format!("{}%", rounded)
}

/// Replaces digits with asterisks while keeping the magnitude readable.
pub fn mask_amount(value: Decimal, symbol: &str) -> String {
    let magnitude = value.abs();
    let pattern = if magnitude >= dec!(1000000) {
        "*,***,***"
    } else if magnitude >= dec!(100000) {
        "***,***"
    } else if magnitude >= dec!(10000) {
        "**,***"
    } else if magnitude >= dec!(1000) {
        "*,***"
    } else if magnitude >= dec!(100) {
        "***"
    } else if magnitude >= dec!(10) {
        "**"
    } else {
        "*"
    };
    format!("{}{}", symbol, pattern)
}

/// Renders a field value for its domain, masking commission figures when
/// requested.
pub fn format_field(field: FinancialField, value: Decimal, options: &DisplayOptions) -> String {
    match field.domain() {
        FieldDomain::Percentage => format_percentage(value),
        FieldDomain::Currency if options.mask_commissions && field.is_commission_figure() => {
            mask_amount(value, &options.currency_symbol)
        }
        FieldDomain::Currency => format_currency(value, &options.currency_symbol),
    }
}

/// Plain editable text for a value, without symbols or separators.
pub fn draft_text(field: FinancialField, value: Decimal) -> String {
    match field.domain() {
        FieldDomain::Currency => {
            let mut rounded = round_to_cents(value);
            rounded.rescale(DISPLAY_DECIMAL_PRECISION);
            rounded.to_string()
        }
        FieldDomain::Percentage => value.normalize().to_string(),
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(dec!(9590), "$"), "$9,590.00");
        assert_eq!(format_currency(dec!(1234567.891), "$"), "$1,234,567.89");
        assert_eq!(format_currency(dec!(0.5), "$"), "$0.50");
        assert_eq!(format_currency(dec!(999), "$"), "$999.00");
        assert_eq!(format_currency(dec!(-535), "$"), "-$535.00");
        assert_eq!(format_currency(Decimal::ZERO, "€"), "€0.00");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(dec!(2.5)), "2.50%");
        assert_eq!(format_percentage(dec!(75)), "75.00%");
    }

    #[test]
    fn test_mask_amount_by_magnitude() {
        assert_eq!(mask_amount(dec!(5), "$"), "$*");
        assert_eq!(mask_amount(dec!(42), "$"), "$**");
        assert_eq!(mask_amount(dec!(535), "$"), "$***");
        assert_eq!(mask_amount(dec!(9590), "$"), "$*,***");
        assert_eq!(mask_amount(dec!(15000), "$"), "$**,***");
        assert_eq!(mask_amount(dec!(250000), "$"), "$***,***");
        assert_eq!(mask_amount(dec!(1500000), "$"), "$*,***,***");
        assert_eq!(mask_amount(dec!(-15000), "$"), "$**,***");
    }

    #[test]
    fn test_format_field_masks_only_commission_figures() {
        let options = DisplayOptions {
            currency_symbol: "$".to_string(),
            mask_commissions: true,
        };
        assert_eq!(
            format_field(FinancialField::PurchasePrice, dec!(500000), &options),
            "$500,000.00"
        );
        assert_eq!(
            format_field(FinancialField::AgentNet, dec!(9590), &options),
            "$*,***"
        );
        assert_eq!(
            format_field(FinancialField::SplitPercentage, dec!(75), &options),
            "75.00%"
        );
    }

    #[test]
    fn test_draft_text() {
        assert_eq!(draft_text(FinancialField::FranchiseFees, dec!(500)), "500.00");
        assert_eq!(draft_text(FinancialField::CommissionRate, dec!(2.5000)), "2.5");
    }
}
