//! SQLite storage implementation for escrows and commission split rules.

mod model;
mod repository;

pub use model::{decode_financials, encode_financials, EscrowDB, NewEscrowDB, SplitRuleDB};
pub use repository::EscrowFinancialsRepository;
