//! Turns a single field change into a new consistent snapshot.

use log::debug;
use rust_decimal::Decimal;

use super::financial_model::FinancialModel;
use super::financials_model::{FieldDomain, FinancialField, FinancialSnapshot};
use super::override_store::OverrideStore;
use crate::constants::{MAX_CURRENCY_AMOUNT, MAX_PERCENTAGE};
use crate::errors::{Result, ValidationError};
use crate::utils::decimal_utils::{round_percentage, round_to_cents};

/// Orchestrates one field change and the override bookkeeping it implies.
///
/// Never persists anything; the caller decides what to do with the result.
pub struct RecalculationScheduler;

impl RecalculationScheduler {
    /// Checks `value` against the domain of `field` and normalizes its
    /// precision (cents for currency, four places for percentages).
    ///
    /// Derived currency fields may hold negative values; inputs may not.
    pub fn validate(field: FinancialField, value: Decimal) -> Result<Decimal> {
        match field.domain() {
            FieldDomain::Percentage => {
                if value < Decimal::ZERO || value > MAX_PERCENTAGE {
                    return Err(ValidationError::PercentageOutOfRange { field }.into());
                }
                Ok(round_percentage(value))
            }
            FieldDomain::Currency => {
                if field.is_input() && value < Decimal::ZERO {
                    return Err(ValidationError::NegativeAmount { field }.into());
                }
                if value.abs() > MAX_CURRENCY_AMOUNT {
                    return Err(ValidationError::AmountTooLarge { field }.into());
                }
                Ok(round_to_cents(value))
            }
        }
    }

    /// Applies a new value for `field` and returns the resulting snapshot and
    /// override set.
    ///
    /// - Input field: the value is written and every non-pinned derived field
    ///   is recomputed.
    /// - Derived field: the value is written, the field is pinned, and only
    ///   its non-pinned dependents are recomputed. Ancestors are untouched.
    ///
    /// On validation failure the inputs are left as they were.
    pub fn apply_input_change(
        snapshot: &FinancialSnapshot,
        overrides: &OverrideStore,
        field: FinancialField,
        new_value: Decimal,
    ) -> Result<(FinancialSnapshot, OverrideStore)> {
        let value = Self::validate(field, new_value)?;
        let written = snapshot.with(field, value);
        let mut next_overrides = overrides.clone();

        let next = if field.is_input() {
            FinancialModel::recompute(&written, &next_overrides)
        } else {
            next_overrides.set(field);
            FinancialModel::recompute_downstream(&written, &next_overrides, field)
        };

        debug!(
            "Applied {} = {} ({} pinned fields)",
            field.key(),
            value,
            next_overrides.len()
        );

        Ok((next, next_overrides))
    }

    /// Unpins `field` and brings it and its dependents back to their formulas.
    ///
    /// Resetting an input field or an unpinned field only recomputes.
    pub fn reset_to_formula(
        snapshot: &FinancialSnapshot,
        overrides: &OverrideStore,
        field: FinancialField,
    ) -> (FinancialSnapshot, OverrideStore) {
        let mut next_overrides = overrides.clone();
        next_overrides.clear(field);

        let mut next = snapshot.clone();
        if let Some(value) = FinancialModel::evaluate(field, &next) {
            next = next.with(field, value);
        }
        let next = FinancialModel::recompute_downstream(&next, &next_overrides, field);

        (next, next_overrides)
    }

    /// Drops every pin and recomputes the whole chain.
    pub fn reset_all(snapshot: &FinancialSnapshot) -> (FinancialSnapshot, OverrideStore) {
        let overrides = OverrideStore::new();
        (FinancialModel::recompute(snapshot, &overrides), overrides)
    }
}
