//! Click-to-edit state machine for a single field.

use rust_decimal::Decimal;
use serde::Serialize;

use super::display::draft_text;
use super::financials_model::{FieldDomain, FinancialField};
use super::input_parser::parse_draft;
use super::recalculation::RecalculationScheduler;
use crate::errors::{Error, Result};
use crate::utils::decimal_utils::{round_percentage, round_to_cents};

/// Lifecycle state of one field.
///
/// `Displaying → Editing → Saving → {Displaying | Editing}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum EditState {
    Displaying,
    Editing {
        draft: String,
        error: Option<String>,
    },
    Saving {
        value: Decimal,
    },
}

/// What caused a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitTrigger {
    /// Explicit confirm, e.g. the submit key.
    Submit,
    /// The input lost focus.
    Blur,
}

/// Result of asking a session to commit its draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitDecision {
    /// Blank or unchanged draft; the session went back to `Displaying`.
    Unchanged,
    /// The parsed value must be saved; the session is now `Saving`.
    Save(Decimal),
}

/// Edit session for exactly one field.
#[derive(Debug, Clone)]
pub struct EditSession {
    field: FinancialField,
    original: Decimal,
    state: EditState,
}

impl EditSession {
    /// Enters `Editing` with the current value as draft.
    pub fn start(field: FinancialField, current: Decimal) -> Self {
        Self {
            field,
            original: current,
            state: EditState::Editing {
                draft: draft_text(field, current),
                error: None,
            },
        }
    }

    pub fn field(&self) -> FinancialField {
        self.field
    }

    /// Value the field had when the session started.
    pub fn original(&self) -> Decimal {
        self.original
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn draft(&self) -> Option<&str> {
        match &self.state {
            EditState::Editing { draft, .. } => Some(draft.as_str()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            EditState::Editing { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    /// `true` while editing or saving.
    pub fn is_active(&self) -> bool {
        !matches!(self.state, EditState::Displaying)
    }

    pub fn is_saving(&self) -> bool {
        matches!(self.state, EditState::Saving { .. })
    }

    /// Replaces the draft text. Clears any inline error.
    pub fn set_draft(&mut self, text: impl Into<String>) -> Result<()> {
        match &mut self.state {
            EditState::Editing { draft, error } => {
                *draft = text.into();
                *error = None;
                Ok(())
            }
            other => Err(Error::EditState(format!(
                "cannot change the draft of {} while {:?}",
                self.field.key(),
                other
            ))),
        }
    }

    /// Parses and validates the draft.
    ///
    /// A blank draft or one equal to `current` at the field's precision goes
    /// straight back to `Displaying`. An invalid draft stays in `Editing` with the error
    /// attached and the validation error is returned. A valid, changed draft
    /// moves the session to `Saving`.
    pub fn prepare_commit(&mut self, current: Decimal) -> Result<CommitDecision> {
        let draft = match &self.state {
            EditState::Editing { draft, .. } => draft.clone(),
            other => {
                return Err(Error::EditState(format!(
                    "cannot commit {} while {:?}",
                    self.field.key(),
                    other
                )))
            }
        };

        let parsed = parse_draft(self.field, &draft)
            .map_err(Error::from)
            .and_then(|value| match value {
                Some(value) => RecalculationScheduler::validate(self.field, value).map(Some),
                None => Ok(None),
            });

        match parsed {
            Ok(None) => {
                self.state = EditState::Displaying;
                Ok(CommitDecision::Unchanged)
            }
            Ok(Some(value)) if value == at_field_precision(self.field, current) => {
                self.state = EditState::Displaying;
                Ok(CommitDecision::Unchanged)
            }
            Ok(Some(value)) => {
                self.state = EditState::Saving { value };
                Ok(CommitDecision::Save(value))
            }
            Err(e) => {
                self.state = EditState::Editing {
                    draft,
                    error: Some(e.user_message()),
                };
                Err(e)
            }
        }
    }

    /// `Saving → Displaying`.
    pub fn mark_saved(&mut self) -> Result<()> {
        if !self.is_saving() {
            return Err(Error::EditState(format!(
                "{} is not being saved",
                self.field.key()
            )));
        }
        self.state = EditState::Displaying;
        Ok(())
    }

    /// `Saving → Editing`, with the original value restored as draft.
    pub fn mark_failed(&mut self, message: impl Into<String>) -> Result<()> {
        if !self.is_saving() {
            return Err(Error::EditState(format!(
                "{} is not being saved",
                self.field.key()
            )));
        }
        self.state = EditState::Editing {
            draft: draft_text(self.field, self.original),
            error: Some(message.into()),
        };
        Ok(())
    }

    /// `Editing → Displaying`, discarding the draft. Not allowed while saving.
    pub fn cancel(&mut self) -> Result<()> {
        if self.is_saving() {
            return Err(Error::EditState(format!(
                "cannot cancel {} while it is being saved",
                self.field.key()
            )));
        }
        self.state = EditState::Displaying;
        Ok(())
    }
}

fn at_field_precision(field: FinancialField, value: Decimal) -> Decimal {
    match field.domain() {
        FieldDomain::Currency => round_to_cents(value),
        FieldDomain::Percentage => round_percentage(value),
    }
}
