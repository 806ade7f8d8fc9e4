//! Financial fields of one open transaction view.

use std::sync::Arc;

use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::Serialize;

use super::breakdown::CommissionBreakdown;
use super::display::{format_field, DisplayOptions};
use super::edit_session::{CommitDecision, CommitTrigger, EditSession, EditState};
use super::financial_model::FinancialModel;
use super::financials_model::{FieldUpdate, FinancialField, FinancialSnapshot, PersistAck};
use super::financials_traits::PersistenceGateway;
use super::override_store::OverrideStore;
use super::recalculation::RecalculationScheduler;
use crate::errors::{Error, Result, ValidationError};
use crate::events::{DomainEvent, DomainEventSink};

/// Outcome of a commit or reset that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CommitOutcome {
    /// Nothing changed and nothing was sent.
    Unchanged,
    /// The change was persisted.
    Saved {
        field: FinancialField,
        /// Overrides dropped because the server snapshot contradicted them.
        cleared_overrides: Vec<FinancialField>,
    },
}

#[derive(Debug, Clone)]
struct Checkpoint {
    snapshot: FinancialSnapshot,
    overrides: OverrideStore,
}

/// Owns the snapshot, the override store and at most one active edit
/// session for a single escrow.
///
/// Every mutating method takes `&mut self`, so two edits can never overlap
/// within one view. Different views share nothing.
pub struct FinancialsEditor {
    escrow_id: String,
    snapshot: FinancialSnapshot,
    overrides: OverrideStore,
    session: Option<EditSession>,
    checkpoint: Option<Checkpoint>,
    gateway: Arc<dyn PersistenceGateway>,
    event_sink: Arc<dyn DomainEventSink>,
    display: DisplayOptions,
}

impl FinancialsEditor {
    pub fn new(
        escrow_id: impl Into<String>,
        snapshot: FinancialSnapshot,
        gateway: Arc<dyn PersistenceGateway>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            escrow_id: escrow_id.into(),
            snapshot,
            overrides: OverrideStore::new(),
            session: None,
            checkpoint: None,
            gateway,
            event_sink,
            display: DisplayOptions::default(),
        }
    }

    pub fn with_display_options(mut self, display: DisplayOptions) -> Self {
        self.display = display;
        self
    }

    pub fn escrow_id(&self) -> &str {
        &self.escrow_id
    }

    pub fn snapshot(&self) -> &FinancialSnapshot {
        &self.snapshot
    }

    pub fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }

    pub fn value(&self, field: FinancialField) -> Decimal {
        self.snapshot.get(field)
    }

    pub fn is_overridden(&self, field: FinancialField) -> bool {
        self.overrides.is_overridden(field)
    }

    pub fn breakdown(&self) -> CommissionBreakdown {
        CommissionBreakdown::from_snapshot(&self.snapshot)
    }

    pub fn set_mask_commissions(&mut self, masked: bool) {
        self.display.mask_commissions = masked;
    }

    /// Formatted value for the `Displaying` state.
    pub fn display_value(&self, field: FinancialField) -> String {
        format_field(field, self.snapshot.get(field), &self.display)
    }

    /// Field currently in `Editing` or `Saving`, if any.
    pub fn active_field(&self) -> Option<FinancialField> {
        self.session
            .as_ref()
            .filter(|s| s.is_active())
            .map(|s| s.field())
    }

    pub fn active_session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    /// State of `field`; every field other than the active one is displaying.
    pub fn edit_state(&self, field: FinancialField) -> EditState {
        match &self.session {
            Some(session) if session.field() == field => session.state().clone(),
            _ => EditState::Displaying,
        }
    }

    /// Enters `Editing` on `field`.
    ///
    /// Fails while another field is being edited or saved. Starting an edit
    /// on the field that is already in `Editing` is a no-op.
    pub fn start_edit(&mut self, field: FinancialField) -> Result<()> {
        if let Some(session) = self.session.as_ref().filter(|s| s.is_active()) {
            if session.field() == field && !session.is_saving() {
                return Ok(());
            }
            return Err(Error::EditInProgress {
                field: session.field(),
            });
        }

        debug!("Start editing {} on escrow {}", field.key(), self.escrow_id);
        self.session = Some(EditSession::start(field, self.snapshot.get(field)));
        Ok(())
    }

    pub fn set_draft(&mut self, text: impl Into<String>) -> Result<()> {
        self.session
            .as_mut()
            .filter(|s| s.is_active())
            .ok_or(Error::NoActiveEdit)?
            .set_draft(text)
    }

    /// Discards the draft without side effects.
    pub fn cancel_edit(&mut self) -> Result<()> {
        let session = self
            .session
            .as_mut()
            .filter(|s| s.is_active())
            .ok_or(Error::NoActiveEdit)?;
        session.cancel()?;
        self.session = None;
        Ok(())
    }

    /// First half of a commit: validates the draft and, when it changed,
    /// applies it optimistically and returns the update to persist.
    ///
    /// Returns `Ok(None)` for a blank or unchanged draft. A validation error
    /// leaves the field in `Editing` with the draft and error visible.
    pub fn begin_commit(&mut self, trigger: CommitTrigger) -> Result<Option<FieldUpdate>> {
        let mut session = self
            .session
            .take()
            .filter(|s| s.is_active())
            .ok_or(Error::NoActiveEdit)?;
        let field = session.field();

        let decision = match session.prepare_commit(self.snapshot.get(field)) {
            Ok(decision) => decision,
            Err(e) => {
                debug!("Rejected draft for {} ({:?}): {}", field.key(), trigger, e);
                self.session = Some(session);
                return Err(e);
            }
        };

        let value = match decision {
            CommitDecision::Unchanged => {
                debug!("No change to {} ({:?}), skipping save", field.key(), trigger);
                return Ok(None);
            }
            CommitDecision::Save(value) => value,
        };

        match RecalculationScheduler::apply_input_change(
            &self.snapshot,
            &self.overrides,
            field,
            value,
        ) {
            Ok((next_snapshot, next_overrides)) => {
                self.checkpoint = Some(Checkpoint {
                    snapshot: std::mem::replace(&mut self.snapshot, next_snapshot),
                    overrides: std::mem::replace(&mut self.overrides, next_overrides),
                });
                self.session = Some(session);
                Ok(Some(self.field_update(field, value)))
            }
            Err(e) => {
                session.mark_failed(e.user_message())?;
                self.session = Some(session);
                Err(e)
            }
        }
    }

    /// Second half of a commit: settles the `Saving` state with the
    /// gateway's answer.
    ///
    /// On success the optimistic snapshot stays (or is replaced by the
    /// server snapshot). On failure the snapshot and overrides are restored
    /// exactly and the field returns to `Editing` with its original value.
    pub fn complete_save(&mut self, result: Result<PersistAck>) -> Result<CommitOutcome> {
        let mut session = self
            .session
            .take()
            .filter(|s| s.is_saving())
            .ok_or_else(|| Error::EditState("no save is in flight".to_string()))?;
        let field = session.field();
        let checkpoint = self
            .checkpoint
            .take()
            .ok_or_else(|| Error::Unexpected("missing rollback checkpoint".to_string()))?;

        match result {
            Ok(ack) => {
                session.mark_saved()?;
                let cleared_overrides = self.accept(ack);
                info!(
                    "Saved {} on escrow {} ({} overrides cleared)",
                    field.key(),
                    self.escrow_id,
                    cleared_overrides.len()
                );
                self.event_sink.emit(DomainEvent::financials_updated(
                    self.escrow_id.clone(),
                    vec![field],
                    cleared_overrides.clone(),
                ));
                Ok(CommitOutcome::Saved {
                    field,
                    cleared_overrides,
                })
            }
            Err(e) => {
                warn!(
                    "Failed to save {} on escrow {}: {}. Rolling back.",
                    field.key(),
                    self.escrow_id,
                    e
                );
                self.snapshot = checkpoint.snapshot;
                self.overrides = checkpoint.overrides;
                session.mark_failed(e.user_message())?;
                self.session = Some(session);
                Err(e)
            }
        }
    }

    /// Commits the active draft and awaits the gateway.
    ///
    /// Both submit and blur commit the same way. An in-flight save cannot
    /// be cancelled; it runs until the gateway resolves.
    pub async fn commit(&mut self, trigger: CommitTrigger) -> Result<CommitOutcome> {
        let update = match self.begin_commit(trigger)? {
            Some(update) => update,
            None => return Ok(CommitOutcome::Unchanged),
        };
        let result = self.gateway.persist(update).await;
        self.complete_save(result)
    }

    /// Unpins a derived field, recomputes it and its dependents, and
    /// persists the recomputed value.
    ///
    /// Rolls back on failure, like a failed commit.
    pub async fn reset_to_formula(&mut self, field: FinancialField) -> Result<CommitOutcome> {
        if let Some(active) = self.active_field() {
            return Err(Error::EditInProgress { field: active });
        }
        if !field.is_derived() {
            return Err(ValidationError::InvalidInput(format!(
                "{} is an input and has no formula",
                field
            ))
            .into());
        }

        let (next_snapshot, next_overrides) =
            RecalculationScheduler::reset_to_formula(&self.snapshot, &self.overrides, field);
        if next_snapshot == self.snapshot && next_overrides == self.overrides {
            return Ok(CommitOutcome::Unchanged);
        }

        let value = next_snapshot.get(field);
        let checkpoint = Checkpoint {
            snapshot: std::mem::replace(&mut self.snapshot, next_snapshot),
            overrides: std::mem::replace(&mut self.overrides, next_overrides),
        };

        let update = self.field_update(field, value);
        match self.gateway.persist(update).await {
            Ok(ack) => {
                let cleared_overrides = self.accept(ack);
                info!("Reset {} on escrow {} to formula", field.key(), self.escrow_id);
                self.event_sink.emit(DomainEvent::financials_updated(
                    self.escrow_id.clone(),
                    vec![field],
                    cleared_overrides.clone(),
                ));
                Ok(CommitOutcome::Saved {
                    field,
                    cleared_overrides,
                })
            }
            Err(e) => {
                warn!(
                    "Failed to reset {} on escrow {}: {}. Rolling back.",
                    field.key(),
                    self.escrow_id,
                    e
                );
                self.snapshot = checkpoint.snapshot;
                self.overrides = checkpoint.overrides;
                Err(e)
            }
        }
    }

    /// Drops every pin and recomputes the chain locally.
    pub fn clear_all_overrides(&mut self) -> Result<()> {
        if let Some(active) = self.active_field() {
            return Err(Error::EditInProgress { field: active });
        }
        let (snapshot, overrides) = RecalculationScheduler::reset_all(&self.snapshot);
        self.snapshot = snapshot;
        self.overrides = overrides;
        Ok(())
    }

    /// Derived fields whose loaded value disagrees with the formula.
    pub fn inconsistent_fields(&self) -> Vec<FinancialField> {
        FinancialModel::inconsistent_fields(&self.snapshot, &self.overrides)
    }

    /// Update for `field`, listing the derived fields the change recomputed.
    ///
    /// Must be built after the new overrides are in place.
    fn field_update(&self, field: FinancialField, value: Decimal) -> FieldUpdate {
        FieldUpdate::new(self.escrow_id.clone(), field, value)
            .with_stale_fields(FinancialModel::recomputed_by(field, &self.overrides))
    }

    /// Applies a successful acknowledgement and returns the overrides it
    /// cleared.
    ///
    /// A server snapshot is authoritative. Any pinned field whose server
    /// value differs from the local value loses its pin.
    fn accept(&mut self, ack: PersistAck) -> Vec<FinancialField> {
        let Some(server) = ack.server_snapshot else {
            return Vec::new();
        };

        let contradicted: Vec<FinancialField> = self
            .overrides
            .iter()
            .filter(|field| server.get(*field) != self.snapshot.get(*field))
            .collect();
        for field in &contradicted {
            debug!("Server value contradicts pinned {}, clearing pin", field.key());
            self.overrides.clear(*field);
        }
        self.snapshot = server;
        contradicted
    }
}
