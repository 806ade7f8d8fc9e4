//! Domain events module.
//!
//! Events are emitted after a change has been persisted. Hosts implement
//! [`DomainEventSink`] to refresh dependent views or reports.

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;
