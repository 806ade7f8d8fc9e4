use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::constants::{CURRENCY_DECIMAL_PRECISION, PERCENT_DECIMAL_PRECISION};

/// Rounds an amount to whole cents, half-up (away from zero on ties).
pub fn round_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(
        CURRENCY_DECIMAL_PRECISION,
        RoundingStrategy::MidpointAwayFromZero,
    )
}

/// Rounds a percentage to the precision kept for rate inputs.
pub fn round_percentage(percent: Decimal) -> Decimal {
    percent.round_dp_with_strategy(
        PERCENT_DECIMAL_PRECISION,
        RoundingStrategy::MidpointAwayFromZero,
    )
}

/// `amount × percent / 100`, rounded to the cent.
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    round_to_cents(amount * percent / dec!(100))
}

/// Sum of currency amounts, rounded to the cent.
pub fn sum_cents<I: IntoIterator<Item = Decimal>>(amounts: I) -> Decimal {
    round_to_cents(amounts.into_iter().sum())
}
