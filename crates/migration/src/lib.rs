pub mod checksum;
pub mod discovery;
pub mod drift;
pub mod error;
pub mod model;
pub mod plan;

pub use checksum::sha256_hex;
pub use discovery::discover_migrations;
pub use drift::{check_ledger_prefix, detect_drift, AppliedMigration};
pub use error::{GapError, MigrationDiscoveryError, MigrationDriftError};
pub use model::MigrationScript;
pub use plan::{plan_pending, PendingPlan};
