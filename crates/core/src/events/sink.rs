//! Domain event sink trait and implementations.

use std::sync::{Arc, Mutex};

use log::info;

use super::DomainEvent;

/// Receives domain events from core services.
///
/// `emit()` is called after a successful persist and must not block; a
/// failure to deliver an event never affects the change that produced it.
pub trait DomainEventSink: Send + Sync {
    fn emit(&self, event: DomainEvent);

    fn emit_batch(&self, events: Vec<DomainEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

/// Discards every event.
#[derive(Clone, Default)]
pub struct NoOpDomainEventSink;

impl DomainEventSink for NoOpDomainEventSink {
    fn emit(&self, _event: DomainEvent) {}
}

/// Writes every event to the `log` facade at info level.
#[derive(Clone, Default)]
pub struct LoggingDomainEventSink;

impl DomainEventSink for LoggingDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        info!("Domain event: {:?}", event);
    }
}

/// Collects events in memory, for tests.
#[derive(Clone, Default)]
pub struct MockDomainEventSink {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl MockDomainEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DomainEventSink for MockDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financials::FinancialField;

    #[test]
    fn test_noop_and_logging_sinks_accept_events() {
        NoOpDomainEventSink.emit(DomainEvent::escrow_created("esc-1"));
        LoggingDomainEventSink.emit_batch(vec![
            DomainEvent::escrow_created("esc-2"),
            DomainEvent::escrow_created("esc-3"),
        ]);
    }

    #[test]
    fn test_mock_sink_collects_events() {
        let sink = MockDomainEventSink::new();
        assert!(sink.is_empty());

        sink.emit(DomainEvent::escrow_created("esc-1"));
        assert_eq!(sink.len(), 1);

        sink.emit_batch(vec![
            DomainEvent::financials_updated("esc-1", vec![FinancialField::TcFee], vec![]),
            DomainEvent::escrow_created("esc-2"),
        ]);
        assert_eq!(sink.len(), 3);
        assert_eq!(sink.events()[0], DomainEvent::escrow_created("esc-1"));

        sink.clear();
        assert!(sink.is_empty());
    }
}
