//! EscrowDesk Core - Commission calculation domain, services, and traits.
//!
//! This crate contains the commission engine for EscrowDesk: the financial
//! formula chain, derived-field overrides, and the per-field edit lifecycle.
//! It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` crate.

pub mod constants;
pub mod errors;
pub mod events;
pub mod financials;
pub mod settings;
pub mod utils;

pub use financials::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
