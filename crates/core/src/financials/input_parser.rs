//! Parsing of free-text drafts into field values.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::financials_model::{FieldDomain, FinancialField};
use crate::errors::ValidationError;

const CURRENCY_FORMATTING_CHARS: [char; 5] = ['$', ',', ' ', '\u{a0}', '_'];

/// Parses a draft for `field`.
///
/// Returns `Ok(None)` for a blank draft. Currency drafts may carry a currency
/// symbol and thousands separators; percentage drafts may end with `%`.
/// Range checks are left to [`super::RecalculationScheduler::validate`].
pub fn parse_draft(field: FinancialField, draft: &str) -> Result<Option<Decimal>, ValidationError> {
    let trimmed = draft.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let cleaned = match field.domain() {
        FieldDomain::Currency => strip_currency_formatting(trimmed),
        FieldDomain::Percentage => trimmed.trim_end_matches('%').trim_end().to_string(),
    };

    if cleaned.is_empty() || cleaned == "-" {
        return Err(ValidationError::NotANumber {
            input: draft.to_string(),
        });
    }

    Decimal::from_str(&cleaned)
        .map(Some)
        .map_err(|_| ValidationError::NotANumber {
            input: draft.to_string(),
        })
}

fn strip_currency_formatting(input: &str) -> String {
    input
        .chars()
        .filter(|c| !CURRENCY_FORMATTING_CHARS.contains(c))
        .collect()
}
