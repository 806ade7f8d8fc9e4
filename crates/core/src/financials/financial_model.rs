//! Formula chain from purchase price to agent net income.

use std::collections::{BTreeSet, VecDeque};

use log::{debug, warn};
use rust_decimal::Decimal;

use super::financials_model::{FinancialDefaults, FinancialField, FinancialSnapshot, StoredFinancials};
use super::override_store::OverrideStore;
use super::recalculation::RecalculationScheduler;
use crate::utils::decimal_utils::{percent_of, round_to_cents};

/// Pure formula set for every derived field.
///
/// All operations are side-effect free. Formulas assume every value lies in
/// its field's domain; `seed` enforces that for loaded records.
pub struct FinancialModel;

impl FinancialModel {
    /// Direct upstream fields of `field`. Empty for inputs.
    pub fn dependencies(field: FinancialField) -> &'static [FinancialField] {
        use FinancialField::*;
        match field {
            BaseCommission => &[PurchasePrice, CommissionRate],
            GrossCommission => &[BaseCommission],
            AdjustedGross => &[GrossCommission, ReferralFees],
            DealNet => &[AdjustedGross, FranchiseFees],
            AgentGci => &[DealNet],
            AgentCommission => &[AgentGci, SplitPercentage],
            AgentNet => &[AgentCommission, TransactionFee, TcFee],
            PurchasePrice | CommissionRate | ReferralFees | FranchiseFees | SplitPercentage
            | TransactionFee | TcFee => &[],
        }
    }

    /// Fields that read `field` directly.
    pub fn dependents(field: FinancialField) -> Vec<FinancialField> {
        FinancialField::ALL
            .iter()
            .copied()
            .filter(|candidate| Self::dependencies(*candidate).contains(&field))
            .collect()
    }

    /// Transitive dependents of `field`, excluding `field` itself.
    pub fn descendants(field: FinancialField) -> BTreeSet<FinancialField> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([field]);
        while let Some(current) = queue.pop_front() {
            for dependent in Self::dependents(current) {
                if seen.insert(dependent) {
                    queue.push_back(dependent);
                }
            }
        }
        seen
    }

    /// Transitive dependencies of `field`, excluding `field` itself.
    pub fn ancestors(field: FinancialField) -> BTreeSet<FinancialField> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([field]);
        while let Some(current) = queue.pop_front() {
            for dependency in Self::dependencies(current) {
                if seen.insert(*dependency) {
                    queue.push_back(*dependency);
                }
            }
        }
        seen
    }

    /// Derived fields whose value a change to `field` recomputes.
    ///
    /// An input change recomputes every non-pinned derived field; a derived
    /// change only its non-pinned descendants.
    pub fn recomputed_by(field: FinancialField, overrides: &OverrideStore) -> Vec<FinancialField> {
        let scope: Vec<FinancialField> = if field.is_input() {
            FinancialField::ALL
                .iter()
                .copied()
                .filter(|candidate| candidate.is_derived())
                .collect()
        } else {
            Self::descendants(field).into_iter().collect()
        };
        scope
            .into_iter()
            .filter(|candidate| !overrides.is_overridden(*candidate))
            .collect()
    }

    /// Applies the formula of a derived field to `snapshot`.
    ///
    /// Returns `None` for input fields.
    pub fn evaluate(field: FinancialField, snapshot: &FinancialSnapshot) -> Option<Decimal> {
        use FinancialField::*;
        let s = snapshot;
        let value = match field {
            BaseCommission => percent_of(s.purchase_price, s.commission_rate),
            GrossCommission => s.base_commission,
            AdjustedGross => round_to_cents(s.gross_commission - s.referral_fees),
            DealNet => round_to_cents(s.adjusted_gross - s.franchise_fees),
            AgentGci => s.deal_net,
            AgentCommission => percent_of(s.agent_gci, s.split_percentage),
            AgentNet => round_to_cents(s.agent_commission - s.transaction_fee - s.tc_fee),
            PurchasePrice | CommissionRate | ReferralFees | FranchiseFees | SplitPercentage
            | TransactionFee | TcFee => return None,
        };
        Some(value)
    }

    /// Recomputes every derived field that is not pinned in `overrides`.
    ///
    /// Fields are visited in dependency order, so each formula reads the
    /// already-updated values of its ancestors.
    pub fn recompute(snapshot: &FinancialSnapshot, overrides: &OverrideStore) -> FinancialSnapshot {
        Self::recompute_fields(snapshot, overrides, |_| true)
    }

    /// Recomputes only the non-pinned transitive dependents of `root`.
    ///
    /// Upstream fields and unrelated branches keep their stored values.
    pub fn recompute_downstream(
        snapshot: &FinancialSnapshot,
        overrides: &OverrideStore,
        root: FinancialField,
    ) -> FinancialSnapshot {
        let targets = Self::descendants(root);
        Self::recompute_fields(snapshot, overrides, |field| targets.contains(&field))
    }

    fn recompute_fields<F>(
        snapshot: &FinancialSnapshot,
        overrides: &OverrideStore,
        include: F,
    ) -> FinancialSnapshot
    where
        F: Fn(FinancialField) -> bool,
    {
        let mut next = snapshot.clone();
        for field in FinancialField::ALL {
            if !field.is_derived() || overrides.is_overridden(field) || !include(field) {
                continue;
            }
            if let Some(value) = Self::evaluate(field, &next) {
                next = next.with(field, value);
            }
        }
        next
    }

    /// Builds the snapshot for a freshly loaded record.
    ///
    /// Missing inputs take their defaults. Derived values present in the
    /// record are kept as stored, even when they disagree with the formula;
    /// missing ones are computed. A stored value outside its field's domain
    /// is treated as missing.
    pub fn seed(stored: &StoredFinancials, defaults: &FinancialDefaults) -> FinancialSnapshot {
        let mut snapshot = FinancialSnapshot::from_inputs(
            Decimal::ZERO,
            defaults.commission_rate,
            Decimal::ZERO,
            Decimal::ZERO,
            defaults.split_percentage,
            defaults.transaction_fee,
            defaults.tc_fee,
        );

        for field in FinancialField::ALL {
            let in_range = stored.get(field).filter(|value| {
                match RecalculationScheduler::validate(field, *value) {
                    Ok(_) => true,
                    Err(e) => {
                        warn!("Ignoring stored {} = {}: {}", field.key(), value, e);
                        false
                    }
                }
            });
            let value = match in_range {
                Some(value) => value,
                None if field.is_input() => defaults.input_default(field).unwrap_or(Decimal::ZERO),
                None => {
                    debug!("Computing missing derived field {} while seeding", field.key());
                    Self::evaluate(field, &snapshot).unwrap_or(Decimal::ZERO)
                }
            };
            snapshot = snapshot.with(field, value);
        }

        snapshot
    }

    /// Derived fields whose stored value disagrees with their formula and
    /// that are not pinned.
    pub fn inconsistent_fields(
        snapshot: &FinancialSnapshot,
        overrides: &OverrideStore,
    ) -> Vec<FinancialField> {
        FinancialField::ALL
            .iter()
            .copied()
            .filter(|field| field.is_derived() && !overrides.is_overridden(*field))
            .filter(|field| Self::evaluate(*field, snapshot) != Some(snapshot.get(*field)))
            .collect()
    }
}
