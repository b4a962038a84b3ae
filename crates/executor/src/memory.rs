//! In-memory [`MigrationTarget`] for exercising the runner without a server.
//!
//! Statements are only remembered, never interpreted. A transaction stages its
//! work and publishes it on commit; dropping or rolling it back discards it.

use crate::target::{MigrationTarget, TargetError, TargetTransaction};
use core::time::Duration;
use strata_migration::{AppliedMigration, MigrationScript};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetEvent {
    Begin,
    Execute(String),
    CreateLedger,
    Record(i64),
    Commit,
    Rollback,
}

#[derive(Debug)]
pub struct MemoryTarget {
    ledger_table: String,
    ledger: Option<Vec<AppliedMigration>>,
    executed: Vec<String>,
    fail_on: Vec<String>,
    stall_on: Vec<String>,
    offline: bool,
    events: Vec<TargetEvent>,
}

impl Default for MemoryTarget {
    fn default() -> Self {
        Self::new("schema_version")
    }
}

impl MemoryTarget {
    pub fn new(ledger_table: impl Into<String>) -> Self {
        Self {
            ledger_table: ledger_table.into(),
            ledger: None,
            executed: Vec::new(),
            fail_on: Vec::new(),
            stall_on: Vec::new(),
            offline: false,
            events: Vec::new(),
        }
    }

    /// Any statement containing `needle` fails like a database error would.
    pub fn fail_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on.push(needle.into());
        self
    }

    /// Any statement containing `needle` never completes.
    pub fn stall_on(mut self, needle: impl Into<String>) -> Self {
        self.stall_on.push(needle.into());
        self
    }

    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Seeds ledger rows as if they had been applied earlier.
    pub fn with_applied(mut self, applied: Vec<AppliedMigration>) -> Self {
        self.ledger = Some(applied);
        self
    }

    pub fn ledger_rows(&self) -> Option<&[AppliedMigration]> {
        self.ledger.as_deref()
    }

    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    pub fn events(&self) -> &[TargetEvent] {
        &self.events
    }

    pub fn begin_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| **e == TargetEvent::Begin)
            .count()
    }

    fn version(&self) -> i64 {
        self.ledger
            .as_ref()
            .and_then(|rows| rows.iter().map(|r| r.sequence).max())
            .unwrap_or(0)
    }

    fn check_online(&self) -> Result<(), TargetError> {
        if self.offline {
            return Err(TargetError::Connection {
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

pub struct MemoryTransaction<'a> {
    target: &'a mut MemoryTarget,
    statements: Vec<String>,
    records: Vec<AppliedMigration>,
    creates_ledger: bool,
}

impl MigrationTarget for MemoryTarget {
    type Transaction<'a> = MemoryTransaction<'a>
    where
        Self: 'a;

    fn ledger_table(&self) -> &str {
        &self.ledger_table
    }

    async fn ledger_exists(&mut self) -> Result<bool, TargetError> {
        self.check_online()?;
        Ok(self.ledger.is_some())
    }

    async fn current_version(&mut self) -> Result<i64, TargetError> {
        self.check_online()?;
        Ok(self.version())
    }

    async fn applied(&mut self) -> Result<Vec<AppliedMigration>, TargetError> {
        self.check_online()?;
        Ok(self.ledger.clone().unwrap_or_default())
    }

    async fn begin(&mut self, _timeout: Duration) -> Result<Self::Transaction<'_>, TargetError> {
        self.check_online()?;
        self.events.push(TargetEvent::Begin);
        Ok(MemoryTransaction {
            target: self,
            statements: Vec::new(),
            records: Vec::new(),
            creates_ledger: false,
        })
    }
}

impl TargetTransaction for MemoryTransaction<'_> {
    async fn execute(&mut self, sql: &str) -> Result<(), TargetError> {
        self.target.check_online()?;
        self.target.events.push(TargetEvent::Execute(sql.to_string()));

        if self.target.stall_on.iter().any(|n| sql.contains(n.as_str())) {
            std::future::pending::<()>().await;
        }

        if self.target.fail_on.iter().any(|n| sql.contains(n.as_str())) {
            return Err(TargetError::Statement {
                message: format!("simulated failure executing: {sql}"),
            });
        }

        self.statements.push(sql.to_string());
        Ok(())
    }

    async fn record(&mut self, script: &MigrationScript) -> Result<(), TargetError> {
        self.target.check_online()?;

        if self.target.ledger.is_none() && !self.creates_ledger {
            self.creates_ledger = true;
            self.target.events.push(TargetEvent::CreateLedger);
        }

        let duplicate = self
            .target
            .ledger
            .iter()
            .flatten()
            .chain(self.records.iter())
            .any(|r| r.sequence == script.sequence);
        if duplicate {
            return Err(TargetError::Statement {
                message: format!(
                    "duplicate key value violates unique constraint (sequence)=({})",
                    script.sequence
                ),
            });
        }

        self.target.events.push(TargetEvent::Record(script.sequence));
        self.records.push(AppliedMigration {
            sequence: script.sequence,
            name: script.name.clone(),
            checksum: Some(script.checksum.clone()),
        });
        Ok(())
    }

    async fn commit(self) -> Result<(), TargetError> {
        self.target.check_online()?;

        let target = self.target;
        if self.creates_ledger {
            target.ledger = Some(Vec::new());
        }
        if let Some(rows) = target.ledger.as_mut() {
            rows.extend(self.records);
        }
        target.executed.extend(self.statements);
        target.events.push(TargetEvent::Commit);
        Ok(())
    }

    async fn rollback(self) -> Result<(), TargetError> {
        self.target.events.push(TargetEvent::Rollback);
        Ok(())
    }
}
