//! Database models for escrows and split rules.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::StorageError;
use escrowdesk_core::financials::{
    EscrowRecord, EscrowStatus, FinancialField, SplitRule, StoredFinancials,
};

/// Database model for escrows
#[derive(
    Queryable, Identifiable, AsChangeset, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::escrows)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct EscrowDB {
    pub id: String,
    pub display_id: Option<String>,
    pub property_address: String,
    pub escrow_status: String,
    pub lead_source: Option<String>,
    pub closing_date: Option<NaiveDate>,
    /// JSON object keyed by field name; values are decimal strings.
    pub financials: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Database model for creating a new escrow
#[derive(Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::escrows)]
#[serde(rename_all = "camelCase")]
pub struct NewEscrowDB {
    pub id: String,
    pub display_id: Option<String>,
    pub property_address: String,
    pub escrow_status: String,
    pub lead_source: Option<String>,
    pub closing_date: Option<NaiveDate>,
    pub financials: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Database model for commission split rules
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::commission_split_rules)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct SplitRuleDB {
    pub id: String,
    pub lead_source: String,
    pub effective_year: i32,
    pub gci_threshold_min: String,
    pub gci_threshold_max: Option<String>,
    pub split_percentage: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Serializes stored financials as `{"purchasePrice": "500000", ...}`.
pub fn encode_financials(financials: &StoredFinancials) -> String {
    let map: Map<String, Value> = financials
        .values
        .iter()
        .map(|(field, value)| (field.key().to_string(), Value::String(value.to_string())))
        .collect();
    Value::Object(map).to_string()
}

/// Reads a financials column.
///
/// Accepts decimal strings and plain JSON numbers. Legacy key spellings are
/// read as aliases, but a canonical key always wins over its alias.
/// Unknown keys and unparseable values are skipped.
pub fn decode_financials(raw: &str) -> StoredFinancials {
    let map = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(Value::Null) => return StoredFinancials::new(),
        Ok(other) => {
            warn!("Ignoring financials column that is not an object: {}", other);
            return StoredFinancials::new();
        }
        Err(e) => {
            warn!("Ignoring unreadable financials column: {}", e);
            return StoredFinancials::new();
        }
    };

    let mut stored = StoredFinancials::new();
    let mut canonical = Vec::new();
    for (key, value) in &map {
        let Some(field) = FinancialField::from_key(key) else {
            continue;
        };
        let Some(amount) = json_decimal(value) else {
            if !value.is_null() {
                warn!("Skipping non-numeric financial value {} = {}", key, value);
            }
            continue;
        };
        if field.key() == key {
            canonical.push((field, amount));
        } else {
            stored.insert(field, amount);
        }
    }
    for (field, amount) in canonical {
        stored.insert(field, amount);
    }
    stored
}

/// Sets one field inside a raw financials object and drops the keys of
/// `stale`, legacy spellings included. Unrelated keys are kept.
pub fn patch_financials(
    raw: &str,
    field: FinancialField,
    value: Decimal,
    stale: &[FinancialField],
) -> String {
    let mut map = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    map.retain(|key, _| {
        FinancialField::from_key(key).map_or(true, |known| !stale.contains(&known))
    });
    map.insert(field.key().to_string(), Value::String(value.to_string()));
    Value::Object(map).to_string()
}

fn json_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        _ => None,
    }
}

fn parse_decimal(column: &str, value: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(value.trim()).map_err(|e| {
        StorageError::SerializationError(format!("invalid decimal in {}: {}", column, e))
    })
}

// Conversion to domain models
impl From<EscrowDB> for EscrowRecord {
    fn from(db: EscrowDB) -> Self {
        let escrow_status = EscrowStatus::parse(&db.escrow_status).unwrap_or_else(|| {
            warn!(
                "Unknown status '{}' on escrow {}, treating as active",
                db.escrow_status, db.id
            );
            EscrowStatus::Active
        });
        Self {
            financials: decode_financials(&db.financials),
            id: db.id,
            display_id: db.display_id,
            property_address: db.property_address,
            escrow_status,
            lead_source: db.lead_source,
            closing_date: db.closing_date,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl TryFrom<SplitRuleDB> for SplitRule {
    type Error = StorageError;

    fn try_from(db: SplitRuleDB) -> Result<Self, Self::Error> {
        Ok(Self {
            gci_threshold_min: parse_decimal("gci_threshold_min", &db.gci_threshold_min)?,
            gci_threshold_max: db
                .gci_threshold_max
                .as_deref()
                .map(|v| parse_decimal("gci_threshold_max", v))
                .transpose()?,
            split_percentage: parse_decimal("split_percentage", &db.split_percentage)?,
            id: db.id,
            lead_source: db.lead_source,
            effective_year: db.effective_year,
            notes: db.notes,
        })
    }
}

impl SplitRuleDB {
    pub fn from_domain(rule: SplitRule, now: NaiveDateTime) -> Self {
        Self {
            id: rule.id,
            lead_source: rule.lead_source,
            effective_year: rule.effective_year,
            gci_threshold_min: rule.gci_threshold_min.to_string(),
            gci_threshold_max: rule.gci_threshold_max.map(|d| d.to_string()),
            split_percentage: rule.split_percentage.to_string(),
            notes: rule.notes,
            created_at: now,
            updated_at: now,
        }
    }
}
