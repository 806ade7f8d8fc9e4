//! User-pinned derived fields for one open transaction view.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::financials_model::FinancialField;

/// Set of fields whose value was deliberately set by the user and must not
/// be replaced by recomputation.
///
/// Held in memory only. The persisted record stores values, not pins, so a
/// freshly loaded transaction starts with an empty store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideStore {
    fields: BTreeSet<FinancialField>,
}

impl OverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins a field. Returns `true` if it was not pinned before.
    pub fn set(&mut self, field: FinancialField) -> bool {
        self.fields.insert(field)
    }

    /// Unpins a field. Returns `true` if it was pinned.
    pub fn clear(&mut self, field: FinancialField) -> bool {
        self.fields.remove(&field)
    }

    pub fn is_overridden(&self, field: FinancialField) -> bool {
        self.fields.contains(&field)
    }

    pub fn clear_all(&mut self) {
        self.fields.clear();
    }

    /// Pinned fields in dependency order.
    pub fn iter(&self) -> impl Iterator<Item = FinancialField> + '_ {
        self.fields.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<FinancialField> for OverrideStore {
    fn from_iter<I: IntoIterator<Item = FinancialField>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
