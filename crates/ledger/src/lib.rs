//! Durable record of which migration scripts a database has applied.

pub mod classify;
pub mod entry;
pub mod error;
pub mod pg;

pub use classify::is_connection_error;
pub use entry::LedgerEntry;
pub use error::LedgerError;
pub use pg::PgLedger;
