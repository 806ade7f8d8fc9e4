//! Read-only summary figures derived from a snapshot.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::financials_model::{FinancialField, FinancialSnapshot};
use crate::utils::decimal_utils::{round_to_cents, sum_cents};

/// Commission breakdown shown next to the editable chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionBreakdown {
    pub gross_commission: Decimal,
    /// Referral plus franchise fees.
    pub total_fee_deductions: Decimal,
    /// Transaction fee plus TC fee.
    pub total_agent_deductions: Decimal,
    /// Share of the agent GCI kept by the brokerage.
    pub brokerage_share: Decimal,
    /// Final pre-tax income.
    pub agent_net: Decimal,
    /// Gross commission as a percentage of the purchase price, if any.
    pub effective_commission_rate: Option<Decimal>,
    /// Currency fields that came out negative.
    pub negative_fields: Vec<FinancialField>,
}

impl CommissionBreakdown {
    pub fn from_snapshot(snapshot: &FinancialSnapshot) -> Self {
        let effective_commission_rate = if snapshot.purchase_price > Decimal::ZERO {
            Some(
                (snapshot.gross_commission / snapshot.purchase_price * dec!(100)).round_dp(4),
            )
        } else {
            None
        };

        Self {
            gross_commission: snapshot.gross_commission,
            total_fee_deductions: sum_cents([snapshot.referral_fees, snapshot.franchise_fees]),
            total_agent_deductions: sum_cents([snapshot.transaction_fee, snapshot.tc_fee]),
            brokerage_share: round_to_cents(snapshot.agent_gci - snapshot.agent_commission),
            agent_net: snapshot.agent_net,
            effective_commission_rate,
            negative_fields: snapshot.negative_fields(),
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.negative_fields.is_empty()
    }
}
