use chrono::{DateTime, Utc};
use strata_migration::AppliedMigration;

/// One row of the ledger table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub sequence: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
    pub checksum: Option<String>,
}

impl From<&LedgerEntry> for AppliedMigration {
    fn from(entry: &LedgerEntry) -> Self {
        AppliedMigration {
            sequence: entry.sequence,
            name: entry.name.clone(),
            checksum: entry.checksum.clone(),
        }
    }
}
