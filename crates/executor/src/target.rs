use core::time::Duration;
use strata_migration::{AppliedMigration, MigrationScript};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("{message}")]
    Connection { message: String },

    #[error("{message}")]
    Statement { message: String },
}

/// A database the runner can migrate.
///
/// The runner only ever holds one transaction at a time and drives it to
/// commit or rollback before beginning the next.
#[allow(async_fn_in_trait)]
pub trait MigrationTarget {
    type Transaction<'a>: TargetTransaction
    where
        Self: 'a;

    fn ledger_table(&self) -> &str;

    async fn ledger_exists(&mut self) -> Result<bool, TargetError>;

    /// Highest recorded sequence, 0 when the ledger does not exist.
    async fn current_version(&mut self) -> Result<i64, TargetError>;

    async fn applied(&mut self) -> Result<Vec<AppliedMigration>, TargetError>;

    /// `timeout` bounds every statement inside the transaction.
    async fn begin(&mut self, timeout: Duration) -> Result<Self::Transaction<'_>, TargetError>;
}

#[allow(async_fn_in_trait)]
pub trait TargetTransaction {
    async fn execute(&mut self, sql: &str) -> Result<(), TargetError>;

    /// Inserts the ledger row for `script`, creating the ledger on first use.
    async fn record(&mut self, script: &MigrationScript) -> Result<(), TargetError>;

    async fn commit(self) -> Result<(), TargetError>;

    async fn rollback(self) -> Result<(), TargetError>;
}
