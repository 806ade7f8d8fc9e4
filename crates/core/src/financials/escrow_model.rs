//! Escrow records as seen by the commission engine.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::financials_model::StoredFinancials;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscrowStatus {
    #[default]
    Active,
    Pending,
    Closed,
    Cancelled,
}

impl EscrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscrowStatus::Active => "ACTIVE",
            EscrowStatus::Pending => "PENDING",
            EscrowStatus::Closed => "CLOSED",
            EscrowStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "ACTIVE" => Some(EscrowStatus::Active),
            "PENDING" => Some(EscrowStatus::Pending),
            "CLOSED" => Some(EscrowStatus::Closed),
            "CANCELLED" | "CANCELED" => Some(EscrowStatus::Cancelled),
            _ => None,
        }
    }
}

/// Domain model representing an escrow and its stored financial fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowRecord {
    pub id: String,
    pub display_id: Option<String>,
    pub property_address: String,
    pub escrow_status: EscrowStatus,
    pub lead_source: Option<String>,
    pub closing_date: Option<NaiveDate>,
    pub financials: StoredFinancials,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a new escrow
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEscrow {
    pub id: Option<String>,
    pub display_id: Option<String>,
    pub property_address: String,
    pub lead_source: Option<String>,
    pub closing_date: Option<NaiveDate>,
    pub financials: StoredFinancials,
}
