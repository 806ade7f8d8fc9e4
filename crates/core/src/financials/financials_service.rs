use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::breakdown::CommissionBreakdown;
use super::commission_split::{resolve_split, SplitDecision};
use super::escrow_model::{EscrowRecord, EscrowStatus, NewEscrow};
use super::financial_model::FinancialModel;
use super::financials_editor::FinancialsEditor;
use super::financials_model::FinancialSnapshot;
use super::financials_traits::{
    EscrowFinancialsRepositoryTrait, FinancialsServiceTrait, PersistenceGateway,
};
use super::recalculation::RecalculationScheduler;
use crate::constants::DEFAULT_LEAD_SOURCE;
use crate::errors::{Result, ValidationError};
use crate::events::{DomainEvent, DomainEventSink};
use crate::settings::{CommissionSettings, SettingsServiceTrait};
use crate::utils::decimal_utils::sum_cents;

/// Service wiring escrow storage, settings and the edit lifecycle together.
pub struct FinancialsService {
    repository: Arc<dyn EscrowFinancialsRepositoryTrait>,
    gateway: Arc<dyn PersistenceGateway>,
    settings_service: Arc<dyn SettingsServiceTrait>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl FinancialsService {
    pub fn new(
        repository: Arc<dyn EscrowFinancialsRepositoryTrait>,
        gateway: Arc<dyn PersistenceGateway>,
        settings_service: Arc<dyn SettingsServiceTrait>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            repository,
            gateway,
            settings_service,
            event_sink,
        }
    }

    fn settings(&self) -> Result<CommissionSettings> {
        self.settings_service.get_commission_settings()
    }

    fn seed(&self, record: &EscrowRecord, settings: &CommissionSettings) -> FinancialSnapshot {
        FinancialModel::seed(&record.financials, &settings.financial_defaults())
    }
}

#[async_trait]
impl FinancialsServiceTrait for FinancialsService {
    fn load_snapshot(&self, escrow_id: &str) -> Result<FinancialSnapshot> {
        let record = self.repository.get_escrow(escrow_id)?;
        let settings = self.settings()?;
        Ok(self.seed(&record, &settings))
    }

    fn open_editor(&self, escrow_id: &str) -> Result<FinancialsEditor> {
        let record = self.repository.get_escrow(escrow_id)?;
        let settings = self.settings()?;
        let snapshot = self.seed(&record, &settings);
        debug!("Opening financials editor for escrow {}", record.id);

        Ok(FinancialsEditor::new(
            record.id,
            snapshot,
            self.gateway.clone(),
            self.event_sink.clone(),
        )
        .with_display_options(settings.display_options()))
    }

    fn get_breakdown(&self, escrow_id: &str) -> Result<CommissionBreakdown> {
        let snapshot = self.load_snapshot(escrow_id)?;
        Ok(CommissionBreakdown::from_snapshot(&snapshot))
    }

    fn get_ytd_gci(&self, year: i32) -> Result<Decimal> {
        let settings = self.settings()?;
        let closed = self.repository.list_closed_escrows(year)?;
        let total = sum_cents(
            closed
                .iter()
                .map(|record| self.seed(record, &settings).agent_gci),
        );
        debug!(
            "YTD GCI for {} is {} over {} closed escrows",
            year,
            total,
            closed.len()
        );
        Ok(total)
    }

    fn suggest_split(&self, escrow_id: &str, year: i32) -> Result<SplitDecision> {
        let record = self.repository.get_escrow(escrow_id)?;
        let ytd_gci = self.get_ytd_gci(year)?;
        let rules = self.repository.get_split_rules(year)?;
        let lead_source = record
            .lead_source
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_LEAD_SOURCE);

        Ok(resolve_split(&rules, ytd_gci, lead_source))
    }

    async fn create_escrow(&self, mut new_escrow: NewEscrow) -> Result<EscrowRecord> {
        if new_escrow.property_address.trim().is_empty() {
            return Err(ValidationError::MissingField("propertyAddress".to_string()).into());
        }
        for (field, value) in new_escrow.financials.values.iter_mut() {
            *value = RecalculationScheduler::validate(*field, *value)?;
        }
        let record = self.repository.create_escrow(new_escrow).await?;
        info!("Created escrow {}", record.id);
        self.event_sink
            .emit(DomainEvent::escrow_created(record.id.clone()));
        Ok(record)
    }

    async fn close_escrow(&self, escrow_id: &str, closing_date: NaiveDate) -> Result<EscrowRecord> {
        let existing = self.repository.get_escrow(escrow_id)?;
        let record = self
            .repository
            .update_escrow_status(escrow_id, EscrowStatus::Closed, Some(closing_date))
            .await?;

        if existing.escrow_status != EscrowStatus::Closed {
            info!("Closed escrow {} on {}", record.id, closing_date);
            self.event_sink.emit(DomainEvent::escrow_status_changed(
                record.id.clone(),
                existing.escrow_status,
                EscrowStatus::Closed,
            ));
        }
        Ok(record)
    }
}
