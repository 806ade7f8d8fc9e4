//! SQLite storage implementation for EscrowDesk.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `escrowdesk-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - The escrow repository, which doubles as the persistence gateway for
//!   single-field financial edits
//! - The settings repository backing commission defaults
//!
//! All writes go through a single writer actor ([`WriteHandle`]); reads use
//! the connection pool.

pub mod db;
pub mod errors;
pub mod schema;

// Repository implementations
pub mod escrows;
pub mod settings;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use escrows::EscrowFinancialsRepository;
pub use settings::SettingsRepository;

// Re-export from escrowdesk-core for convenience
pub use escrowdesk_core::errors::{DatabaseError, Error, Result};
