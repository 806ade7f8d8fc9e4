use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::breakdown::CommissionBreakdown;
use super::commission_split::{SplitDecision, SplitRule};
use super::escrow_model::{EscrowRecord, EscrowStatus, NewEscrow};
use super::financials_editor::FinancialsEditor;
use super::financials_model::{FieldUpdate, FinancialSnapshot, PersistAck};
use crate::errors::Result;

/// Partial-update contract used by the edit lifecycle.
///
/// An implementation receives exactly one changed field and either accepts
/// it (optionally returning an authoritative server snapshot) or fails.
/// Timeouts are the implementation's concern.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn persist(&self, update: FieldUpdate) -> Result<PersistAck>;
}

/// Trait for escrow financials repository operations
#[async_trait]
pub trait EscrowFinancialsRepositoryTrait: Send + Sync {
    fn get_escrow(&self, escrow_id: &str) -> Result<EscrowRecord>;
    async fn create_escrow(&self, new_escrow: NewEscrow) -> Result<EscrowRecord>;
    async fn update_escrow_status(
        &self,
        escrow_id: &str,
        status: EscrowStatus,
        closing_date: Option<NaiveDate>,
    ) -> Result<EscrowRecord>;
    fn list_closed_escrows(&self, year: i32) -> Result<Vec<EscrowRecord>>;
    fn get_split_rules(&self, year: i32) -> Result<Vec<SplitRule>>;
    async fn save_split_rule(&self, rule: SplitRule) -> Result<SplitRule>;
}

/// Trait for financials service operations
#[async_trait]
pub trait FinancialsServiceTrait: Send + Sync {
    fn load_snapshot(&self, escrow_id: &str) -> Result<FinancialSnapshot>;
    fn open_editor(&self, escrow_id: &str) -> Result<FinancialsEditor>;
    fn get_breakdown(&self, escrow_id: &str) -> Result<CommissionBreakdown>;
    fn get_ytd_gci(&self, year: i32) -> Result<Decimal>;
    fn suggest_split(&self, escrow_id: &str, year: i32) -> Result<SplitDecision>;
    async fn create_escrow(&self, new_escrow: NewEscrow) -> Result<EscrowRecord>;
    async fn close_escrow(&self, escrow_id: &str, closing_date: NaiveDate) -> Result<EscrowRecord>;
}
