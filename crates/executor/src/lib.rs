//! Migration runner: reads the ledger, computes the pending scripts and
//! applies them one transaction at a time.

pub mod error;
pub mod memory;
pub mod mode;
pub mod runner;
pub mod statement;
pub mod target;
pub mod transaction;

pub use error::{ErrorKind, ExecutorError};
pub use memory::{MemoryTarget, TargetEvent};
pub use mode::ExecutionMode;
pub use runner::{RunReport, Runner, RunnerOptions, ScriptRef};
pub use target::{MigrationTarget, TargetError, TargetTransaction};
pub use transaction::{PgTarget, PgTargetTransaction};
