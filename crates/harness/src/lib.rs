//! Integration harness: migrate a throwaway database from scratch and compare
//! its structure with the committed golden dump.

pub mod ephemeral;
pub mod error;
pub mod run;

pub use ephemeral::{with_ephemeral_database, EphemeralDatabase};
pub use error::{DriftError, HarnessError};
pub use run::{run_full_migration, HarnessConfig, HarnessReport};
