//! Financial field catalogue and snapshot models.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_COMMISSION_RATE, DEFAULT_SPLIT_PERCENTAGE, DEFAULT_TC_FEE, DEFAULT_TRANSACTION_FEE,
    FINANCIALS_PATH_PREFIX,
};
use crate::errors::ValidationError;

/// Whether a field is set directly or computed from other fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldKind {
    Input,
    Derived,
}

/// Numeric domain of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldDomain {
    Currency,
    Percentage,
}

/// Closed set of financial fields on an escrow.
///
/// Declaration order is a valid topological order of the dependency graph:
/// every derived field comes after all of its ancestors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FinancialField {
    PurchasePrice,
    CommissionRate,
    BaseCommission,
    GrossCommission,
    ReferralFees,
    FranchiseFees,
    AdjustedGross,
    DealNet,
    #[serde(rename = "agentGCI")]
    AgentGci,
    SplitPercentage,
    AgentCommission,
    TransactionFee,
    TcFee,
    AgentNet,
}

impl FinancialField {
    /// All fields in dependency order.
    pub const ALL: [FinancialField; 14] = [
        FinancialField::PurchasePrice,
        FinancialField::CommissionRate,
        FinancialField::BaseCommission,
        FinancialField::GrossCommission,
        FinancialField::ReferralFees,
        FinancialField::FranchiseFees,
        FinancialField::AdjustedGross,
        FinancialField::DealNet,
        FinancialField::AgentGci,
        FinancialField::SplitPercentage,
        FinancialField::AgentCommission,
        FinancialField::TransactionFee,
        FinancialField::TcFee,
        FinancialField::AgentNet,
    ];

    /// Canonical key used in persisted records.
    pub fn key(self) -> &'static str {
        match self {
            FinancialField::PurchasePrice => "purchasePrice",
            FinancialField::CommissionRate => "commissionRate",
            FinancialField::BaseCommission => "baseCommission",
            FinancialField::GrossCommission => "grossCommission",
            FinancialField::ReferralFees => "referralFees",
            FinancialField::FranchiseFees => "franchiseFees",
            FinancialField::AdjustedGross => "adjustedGross",
            FinancialField::DealNet => "dealNet",
            FinancialField::AgentGci => "agentGCI",
            FinancialField::SplitPercentage => "splitPercentage",
            FinancialField::AgentCommission => "agentCommission",
            FinancialField::TransactionFee => "transactionFee",
            FinancialField::TcFee => "tcFee",
            FinancialField::AgentNet => "agentNet",
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            FinancialField::PurchasePrice => "Purchase Price",
            FinancialField::CommissionRate => "Commission Rate",
            FinancialField::BaseCommission => "Base Commission",
            FinancialField::GrossCommission => "Gross Commission",
            FinancialField::ReferralFees => "Referral Fees",
            FinancialField::FranchiseFees => "Franchise Fees",
            FinancialField::AdjustedGross => "Adjusted Gross",
            FinancialField::DealNet => "Deal Net",
            FinancialField::AgentGci => "Agent GCI",
            FinancialField::SplitPercentage => "Split Percentage",
            FinancialField::AgentCommission => "Agent Commission",
            FinancialField::TransactionFee => "Transaction Fee",
            FinancialField::TcFee => "TC Fee",
            FinancialField::AgentNet => "Agent Net (1099 Income)",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            FinancialField::PurchasePrice
            | FinancialField::CommissionRate
            | FinancialField::ReferralFees
            | FinancialField::FranchiseFees
            | FinancialField::SplitPercentage
            | FinancialField::TransactionFee
            | FinancialField::TcFee => FieldKind::Input,
            _ => FieldKind::Derived,
        }
    }

    pub fn domain(self) -> FieldDomain {
        match self {
            FinancialField::CommissionRate | FinancialField::SplitPercentage => {
                FieldDomain::Percentage
            }
            _ => FieldDomain::Currency,
        }
    }

    pub fn is_input(self) -> bool {
        self.kind() == FieldKind::Input
    }

    pub fn is_derived(self) -> bool {
        self.kind() == FieldKind::Derived
    }

    /// Commission figures are the ones hidden by the masked display mode.
    pub fn is_commission_figure(self) -> bool {
        self.domain() == FieldDomain::Currency && self != FinancialField::PurchasePrice
    }

    /// Dot-addressed path used by partial updates, e.g. `financials.tcFee`.
    pub fn path(self) -> String {
        format!("{}.{}", FINANCIALS_PATH_PREFIX, self.key())
    }

    /// Resolves a stored key, accepting the legacy aliases found in older records.
    pub fn from_key(key: &str) -> Option<FinancialField> {
        let field = match key {
            "purchasePrice" | "purchase_price" => FinancialField::PurchasePrice,
            "commissionRate" | "commission_rate" | "commissionPercentage"
            | "commission_percentage" => FinancialField::CommissionRate,
            "baseCommission" | "base_commission" => FinancialField::BaseCommission,
            "grossCommission" | "gross_commission" => FinancialField::GrossCommission,
            "referralFees" | "referral_fees" | "grossCommissionFees" => {
                FinancialField::ReferralFees
            }
            "franchiseFees" | "franchise_fees" | "dealExpense" => FinancialField::FranchiseFees,
            "adjustedGross" | "adjusted_gross" => FinancialField::AdjustedGross,
            "dealNet" | "deal_net" => FinancialField::DealNet,
            "agentGCI" | "agentGci" | "agent_gci" => FinancialField::AgentGci,
            "splitPercentage" | "split_percentage" => FinancialField::SplitPercentage,
            "agentCommission" | "agent_commission" => FinancialField::AgentCommission,
            "transactionFee" | "transaction_fee" => FinancialField::TransactionFee,
            "tcFee" | "tc_fee" => FinancialField::TcFee,
            "agentNet" | "agent_net" | "agent1099Income" => FinancialField::AgentNet,
            _ => return None,
        };
        Some(field)
    }

    /// Resolves a dot-addressed path such as `financials.grossCommission`.
    pub fn from_path(path: &str) -> Result<FinancialField, ValidationError> {
        path.strip_prefix(FINANCIALS_PATH_PREFIX)
            .and_then(|rest| rest.strip_prefix('.'))
            .and_then(FinancialField::from_key)
            .ok_or_else(|| ValidationError::UnknownField(path.to_string()))
    }
}

impl fmt::Display for FinancialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FinancialField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FinancialField::from_key(s).ok_or_else(|| ValidationError::UnknownField(s.to_string()))
    }
}

/// Default values applied to inputs missing from a stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialDefaults {
    pub commission_rate: Decimal,
    pub split_percentage: Decimal,
    pub transaction_fee: Decimal,
    pub tc_fee: Decimal,
}

impl Default for FinancialDefaults {
    fn default() -> Self {
        Self {
            commission_rate: DEFAULT_COMMISSION_RATE,
            split_percentage: DEFAULT_SPLIT_PERCENTAGE,
            transaction_fee: DEFAULT_TRANSACTION_FEE,
            tc_fee: DEFAULT_TC_FEE,
        }
    }
}

impl FinancialDefaults {
    /// Default for an input field; `None` for derived fields.
    pub fn input_default(&self, field: FinancialField) -> Option<Decimal> {
        match field {
            FinancialField::CommissionRate => Some(self.commission_rate),
            FinancialField::SplitPercentage => Some(self.split_percentage),
            FinancialField::TransactionFee => Some(self.transaction_fee),
            FinancialField::TcFee => Some(self.tc_fee),
            FinancialField::PurchasePrice
            | FinancialField::ReferralFees
            | FinancialField::FranchiseFees => Some(Decimal::ZERO),
            _ => None,
        }
    }
}

/// Field values exactly as found in a persisted record.
///
/// Only the keys present in the record are held; missing inputs receive
/// defaults and missing derived fields are computed when seeding a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredFinancials {
    pub values: BTreeMap<FinancialField, Decimal>,
}

impl StoredFinancials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: FinancialField) -> Option<Decimal> {
        self.values.get(&field).copied()
    }

    pub fn insert(&mut self, field: FinancialField, value: Decimal) {
        self.values.insert(field, value);
    }

    pub fn with(mut self, field: FinancialField, value: Decimal) -> Self {
        self.insert(field, value);
        self
    }
}

/// Immutable record of every financial field on one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSnapshot {
    pub purchase_price: Decimal,
    pub commission_rate: Decimal,
    pub base_commission: Decimal,
    pub gross_commission: Decimal,
    pub referral_fees: Decimal,
    pub franchise_fees: Decimal,
    pub adjusted_gross: Decimal,
    pub deal_net: Decimal,
    #[serde(rename = "agentGCI")]
    pub agent_gci: Decimal,
    pub split_percentage: Decimal,
    pub agent_commission: Decimal,
    pub transaction_fee: Decimal,
    pub tc_fee: Decimal,
    pub agent_net: Decimal,
}

impl FinancialSnapshot {
    /// Snapshot holding only the given inputs; derived fields are zero until
    /// the snapshot is recomputed.
    pub fn from_inputs(
        purchase_price: Decimal,
        commission_rate: Decimal,
        referral_fees: Decimal,
        franchise_fees: Decimal,
        split_percentage: Decimal,
        transaction_fee: Decimal,
        tc_fee: Decimal,
    ) -> Self {
        Self {
            purchase_price,
            commission_rate,
            base_commission: Decimal::ZERO,
            gross_commission: Decimal::ZERO,
            referral_fees,
            franchise_fees,
            adjusted_gross: Decimal::ZERO,
            deal_net: Decimal::ZERO,
            agent_gci: Decimal::ZERO,
            split_percentage,
            agent_commission: Decimal::ZERO,
            transaction_fee,
            tc_fee,
            agent_net: Decimal::ZERO,
        }
    }

    pub fn get(&self, field: FinancialField) -> Decimal {
        match field {
            FinancialField::PurchasePrice => self.purchase_price,
            FinancialField::CommissionRate => self.commission_rate,
            FinancialField::BaseCommission => self.base_commission,
            FinancialField::GrossCommission => self.gross_commission,
            FinancialField::ReferralFees => self.referral_fees,
            FinancialField::FranchiseFees => self.franchise_fees,
            FinancialField::AdjustedGross => self.adjusted_gross,
            FinancialField::DealNet => self.deal_net,
            FinancialField::AgentGci => self.agent_gci,
            FinancialField::SplitPercentage => self.split_percentage,
            FinancialField::AgentCommission => self.agent_commission,
            FinancialField::TransactionFee => self.transaction_fee,
            FinancialField::TcFee => self.tc_fee,
            FinancialField::AgentNet => self.agent_net,
        }
    }

    /// Returns a copy with one field replaced. No recomputation happens here.
    pub fn with(&self, field: FinancialField, value: Decimal) -> Self {
        let mut next = self.clone();
        let slot = match field {
            FinancialField::PurchasePrice => &mut next.purchase_price,
            FinancialField::CommissionRate => &mut next.commission_rate,
            FinancialField::BaseCommission => &mut next.base_commission,
            FinancialField::GrossCommission => &mut next.gross_commission,
            FinancialField::ReferralFees => &mut next.referral_fees,
            FinancialField::FranchiseFees => &mut next.franchise_fees,
            FinancialField::AdjustedGross => &mut next.adjusted_gross,
            FinancialField::DealNet => &mut next.deal_net,
            FinancialField::AgentGci => &mut next.agent_gci,
            FinancialField::SplitPercentage => &mut next.split_percentage,
            FinancialField::AgentCommission => &mut next.agent_commission,
            FinancialField::TransactionFee => &mut next.transaction_fee,
            FinancialField::TcFee => &mut next.tc_fee,
            FinancialField::AgentNet => &mut next.agent_net,
        };
        *slot = value;
        next
    }

    /// Iterates `(field, value)` pairs in dependency order.
    pub fn iter(&self) -> impl Iterator<Item = (FinancialField, Decimal)> + '_ {
        FinancialField::ALL.iter().map(move |f| (*f, self.get(*f)))
    }

    /// Currency fields whose value is below zero.
    ///
    /// Negative results are shown as-is and flagged, never clamped.
    pub fn negative_fields(&self) -> Vec<FinancialField> {
        self.iter()
            .filter(|(field, value)| field.domain() == FieldDomain::Currency && *value < Decimal::ZERO)
            .map(|(field, _)| field)
            .collect()
    }

    /// Converts the snapshot into its persisted form.
    pub fn to_stored(&self) -> StoredFinancials {
        StoredFinancials {
            values: self.iter().collect(),
        }
    }
}

/// Partial update request carrying exactly one changed field.
///
/// `stale_paths` names derived fields that the change recomputed and that
/// are not pinned. A backend that stores values verbatim drops them so the
/// next load computes them again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldUpdate {
    pub escrow_id: String,
    pub path: String,
    pub value: Decimal,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stale_paths: Vec<String>,
}

impl FieldUpdate {
    pub fn new(escrow_id: impl Into<String>, field: FinancialField, value: Decimal) -> Self {
        Self {
            escrow_id: escrow_id.into(),
            path: field.path(),
            value,
            stale_paths: Vec::new(),
        }
    }

    pub fn with_stale_fields<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = FinancialField>,
    {
        self.stale_paths = fields.into_iter().map(FinancialField::path).collect();
        self
    }

    pub fn field(&self) -> Result<FinancialField, ValidationError> {
        FinancialField::from_path(&self.path)
    }

    pub fn stale_fields(&self) -> Result<Vec<FinancialField>, ValidationError> {
        self.stale_paths
            .iter()
            .map(|path| FinancialField::from_path(path))
            .collect()
    }

    /// Nested JSON body for the update, e.g. `{"financials":{"tcFee":"300"}}`.
    ///
    /// Values are sent as strings so no precision is lost in transit. Stale
    /// paths are sent as `null`.
    pub fn to_patch_body(&self) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        insert_path(
            &mut body,
            &self.path,
            serde_json::Value::String(self.value.to_string()),
        );
        for path in &self.stale_paths {
            insert_path(&mut body, path, serde_json::Value::Null);
        }
        serde_json::Value::Object(body)
    }
}

fn insert_path(
    target: &mut serde_json::Map<String, serde_json::Value>,
    path: &str,
    value: serde_json::Value,
) {
    match path.split_once('.') {
        Some((head, rest)) => {
            let entry = target
                .entry(head.to_string())
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
            if !entry.is_object() {
                *entry = serde_json::Value::Object(serde_json::Map::new());
            }
            if let serde_json::Value::Object(nested) = entry {
                insert_path(nested, rest, value);
            }
        }
        None => {
            target.insert(path.to_string(), value);
        }
    }
}

/// Response to a persist request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistAck {
    /// Authoritative snapshot when the backend recomputes independently.
    pub server_snapshot: Option<FinancialSnapshot>,
}

impl PersistAck {
    pub fn accepted() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: FinancialSnapshot) -> Self {
        Self {
            server_snapshot: Some(snapshot),
        }
    }
}
