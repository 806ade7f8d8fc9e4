//! Commission calculation and override engine.

pub mod breakdown;
pub mod commission_split;
pub mod display;
pub mod edit_session;
pub mod escrow_model;
pub mod financial_model;
pub mod financials_editor;
pub mod financials_model;
pub mod financials_service;
pub mod financials_traits;
pub mod input_parser;
pub mod override_store;
pub mod recalculation;

#[cfg(test)]
mod financials_service_tests;

pub use breakdown::CommissionBreakdown;
pub use commission_split::{resolve_split, CapStatus, SplitDecision, SplitRule};
pub use display::{draft_text, format_currency, format_field, format_percentage, DisplayOptions};
pub use edit_session::{CommitDecision, CommitTrigger, EditSession, EditState};
pub use escrow_model::{EscrowRecord, EscrowStatus, NewEscrow};
pub use financial_model::FinancialModel;
pub use financials_editor::{CommitOutcome, FinancialsEditor};
pub use financials_model::{
    FieldDomain, FieldKind, FieldUpdate, FinancialDefaults, FinancialField, FinancialSnapshot,
    PersistAck, StoredFinancials,
};
pub use financials_service::FinancialsService;
pub use financials_traits::{
    EscrowFinancialsRepositoryTrait, FinancialsServiceTrait, PersistenceGateway,
};
pub use input_parser::parse_draft;
pub use override_store::OverrideStore;
pub use recalculation::RecalculationScheduler;
