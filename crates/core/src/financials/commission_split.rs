//! Split tiers driven by an agent's year-to-date gross commission income.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_LEAD_SOURCE, FALLBACK_SPLIT_PERCENTAGE, MID_TIER_GCI_THRESHOLD, POST_CAP_GCI_THRESHOLD,
};

/// Where an agent sits relative to the brokerage cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapStatus {
    PreCap,
    MidTier,
    PostCap,
}

impl CapStatus {
    pub fn from_ytd_gci(ytd_gci: Decimal) -> Self {
        if ytd_gci >= POST_CAP_GCI_THRESHOLD {
            CapStatus::PostCap
        } else if ytd_gci >= MID_TIER_GCI_THRESHOLD {
            CapStatus::MidTier
        } else {
            CapStatus::PreCap
        }
    }
}

/// One tier of the brokerage's split schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitRule {
    pub id: String,
    pub lead_source: String,
    pub effective_year: i32,
    pub gci_threshold_min: Decimal,
    /// Exclusive upper bound; `None` means unbounded.
    pub gci_threshold_max: Option<Decimal>,
    pub split_percentage: Decimal,
    pub notes: Option<String>,
}

impl SplitRule {
    pub fn matches(&self, ytd_gci: Decimal, lead_source: &str) -> bool {
        (self.lead_source == lead_source || self.lead_source == DEFAULT_LEAD_SOURCE)
            && self.gci_threshold_min <= ytd_gci
            && self.gci_threshold_max.map_or(true, |max| max > ytd_gci)
    }
}

/// Split percentage chosen for a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitDecision {
    pub split_percentage: Decimal,
    pub cap_status: CapStatus,
    pub rule_id: Option<String>,
    pub description: String,
}

/// Picks the split for an agent with `ytd_gci` on a lead from `lead_source`.
///
/// Rules for the exact lead source win over `default` rules; among those the
/// one with the highest lower threshold wins. Falls back to a 70% split when
/// nothing matches.
pub fn resolve_split(rules: &[SplitRule], ytd_gci: Decimal, lead_source: &str) -> SplitDecision {
    let cap_status = CapStatus::from_ytd_gci(ytd_gci);

    let best = rules
        .iter()
        .filter(|rule| rule.matches(ytd_gci, lead_source))
        .max_by(|a, b| {
            let a_specific = a.lead_source == lead_source;
            let b_specific = b.lead_source == lead_source;
            a_specific
                .cmp(&b_specific)
                .then(a.gci_threshold_min.cmp(&b.gci_threshold_min))
        });

    match best {
        Some(rule) => SplitDecision {
            split_percentage: rule.split_percentage,
            cap_status,
            rule_id: Some(rule.id.clone()),
            description: rule
                .notes
                .clone()
                .unwrap_or_else(|| format!("{}% split", rule.split_percentage.normalize())),
        },
        None => SplitDecision {
            split_percentage: FALLBACK_SPLIT_PERCENTAGE,
            cap_status,
            rule_id: None,
            description: "default".to_string(),
        },
    }
}
