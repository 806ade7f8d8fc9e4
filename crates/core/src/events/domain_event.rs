//! Domain event types.

use serde::{Deserialize, Serialize};

use crate::financials::{EscrowStatus, FinancialField};

/// Domain events emitted by core services after successful mutations.
///
/// These events represent facts about persisted data. Runtime adapters
/// translate them into platform-specific actions (dashboard refresh,
/// commission report invalidation, etc.).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// One or more financial fields of an escrow were persisted.
    FinancialsUpdated {
        escrow_id: String,
        fields: Vec<FinancialField>,
        /// Fields whose override was dropped while reconciling with the server
        cleared_overrides: Vec<FinancialField>,
    },

    /// A new escrow was created.
    EscrowCreated { escrow_id: String },

    /// Escrow status changed. Closing an escrow changes the agent's YTD GCI.
    EscrowStatusChanged {
        escrow_id: String,
        old_status: EscrowStatus,
        new_status: EscrowStatus,
    },
}

impl DomainEvent {
    /// Creates a FinancialsUpdated event.
    pub fn financials_updated(
        escrow_id: impl Into<String>,
        fields: Vec<FinancialField>,
        cleared_overrides: Vec<FinancialField>,
    ) -> Self {
        Self::FinancialsUpdated {
            escrow_id: escrow_id.into(),
            fields,
            cleared_overrides,
        }
    }

    /// Creates an EscrowCreated event.
    pub fn escrow_created(escrow_id: impl Into<String>) -> Self {
        Self::EscrowCreated {
            escrow_id: escrow_id.into(),
        }
    }

    /// Creates an EscrowStatusChanged event.
    pub fn escrow_status_changed(
        escrow_id: impl Into<String>,
        old_status: EscrowStatus,
        new_status: EscrowStatus,
    ) -> Self {
        Self::EscrowStatusChanged {
            escrow_id: escrow_id.into(),
            old_status,
            new_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_financials_updated_serialization() {
        let event = DomainEvent::financials_updated(
            "esc-1",
            vec![FinancialField::GrossCommission],
            vec![],
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"financials_updated\""));
        assert!(json.contains("\"grossCommission\""));

        let deserialized: DomainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[test]
    fn test_escrow_status_changed_serialization() {
        let event =
            DomainEvent::escrow_status_changed("esc-1", EscrowStatus::Pending, EscrowStatus::Closed);

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: DomainEvent = serde_json::from_str(&json).unwrap();

        match deserialized {
            DomainEvent::EscrowStatusChanged {
                escrow_id,
                old_status,
                new_status,
            } => {
                assert_eq!(escrow_id, "esc-1");
                assert_eq!(old_status, EscrowStatus::Pending);
                assert_eq!(new_status, EscrowStatus::Closed);
            }
            _ => panic!("Expected EscrowStatusChanged"),
        }
    }
}
