use core::fmt;

use strata_config::ConfigError;
use strata_executor::{ErrorKind, ExecutorError};
use strata_harness::{DriftError, HarnessError};
use strata_ledger::LedgerError;
use strata_lock::LockError;
use strata_migration::{GapError, MigrationDiscoveryError, MigrationDriftError};
use strata_schema::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    UserError = 1,
    MigrationFailed = 2,
    LockUnavailable = 3,
    ConnectionError = 4,
    GapError = 5,
    Drift = 6,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone)]
pub struct CliError {
    code: ExitCode,
    title: String,
    reason: Option<String>,
    meaning: Option<String>,
    action: Option<String>,
}

impl CliError {
    fn new(code: ExitCode, title: impl Into<String>) -> Self {
        Self {
            code,
            title: title.into(),
            reason: None,
            meaning: None,
            action: None,
        }
    }

    pub fn user_error(title: impl Into<String>) -> Self {
        Self::new(ExitCode::UserError, title)
    }

    pub fn migration_failed(title: impl Into<String>) -> Self {
        Self::new(ExitCode::MigrationFailed, title)
    }

    pub fn lock_unavailable(title: impl Into<String>) -> Self {
        Self::new(ExitCode::LockUnavailable, title)
    }

    pub fn connection_error(title: impl Into<String>) -> Self {
        Self::new(ExitCode::ConnectionError, title)
    }

    pub fn gap_error(title: impl Into<String>) -> Self {
        Self::new(ExitCode::GapError, title)
    }

    pub fn drift(title: impl Into<String>) -> Self {
        Self::new(ExitCode::Drift, title)
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_meaning(mut self, meaning: impl Into<String>) -> Self {
        self.meaning = Some(meaning.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn meaning(&self) -> Option<&str> {
        self.meaning.as_deref()
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn code(&self) -> ExitCode {
        self.code
    }

    pub fn exit_code(&self) -> i32 {
        self.code.as_i32()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

impl std::error::Error for CliError {}

pub fn map_config_error(err: ConfigError) -> CliError {
    let err_text = err.to_string();
    let base = CliError::user_error("Invalid configuration").with_reason(err_text);

    match err {
        ConfigError::MissingDatabaseUrl => base
            .with_action("Pass --database-url or set DATABASE_URL (a .env file is read too)."),
        _ => base.with_action("Fix the flag or environment variable named above."),
    }
}

pub fn map_discovery_error(err: MigrationDiscoveryError) -> CliError {
    CliError::user_error("Migration discovery failed")
        .with_reason(err.to_string())
        .with_action("Script files must be named <sequence>_<name>.sql, e.g. 00001_create_users.sql.")
}

pub fn map_connect_error(err: sqlx::Error) -> CliError {
    CliError::connection_error("Database connection failed")
        .with_reason(err.to_string())
        .with_meaning("Nothing was changed.")
        .with_action("Check that the database is reachable, then retry.")
}

pub fn map_gap_error(err: GapError) -> CliError {
    CliError::gap_error("Migration sequence gap")
        .with_reason(err.to_string())
        .with_meaning("The script repository and the ledger disagree about ordering. No script was applied.")
        .with_action("Restore the missing script or fix its sequence number; never renumber applied scripts.")
}

pub fn map_drift_error(err: MigrationDriftError) -> CliError {
    match err {
        MigrationDriftError::MissingScript { sequence, name } => {
            map_gap_error(GapError::MissingScript { sequence, name })
        }
        err @ MigrationDriftError::ChecksumMismatch { .. } => {
            CliError::gap_error("Applied migration was modified")
                .with_reason(err.to_string())
                .with_meaning("Applied scripts are immutable; this database was built from a different version of the script.")
                .with_action("Revert the edit and add a new migration for the change instead.")
        }
    }
}

pub fn map_ledger_error(err: LedgerError) -> CliError {
    match err {
        LedgerError::Connection { .. } => CliError::connection_error("Lost connection while reading the ledger")
            .with_reason(err.to_string())
            .with_action("Retry once the database is reachable."),
        LedgerError::Query { .. } => CliError::user_error("Ledger could not be read")
            .with_reason(err.to_string())
            .with_meaning("The current version of this database is unknown."),
        LedgerError::InvalidConfig { .. } => CliError::user_error("Invalid ledger configuration")
            .with_reason(err.to_string()),
    }
}

pub fn map_lock_error(err: LockError) -> CliError {
    match err {
        LockError::MigrationLockUnavailable { .. } => {
            CliError::lock_unavailable("Another migration process is currently running")
                .with_reason(err.to_string())
                .with_action("Wait for it to finish or raise --lock-timeout-ms.")
        }
        LockError::LockAcquireFailed { .. } => CliError::connection_error("Failed to acquire migration lock")
            .with_reason(err.to_string()),
        LockError::LockReleaseFailed { .. } => CliError::connection_error("Failed to release migration lock")
            .with_reason(err.to_string())
            .with_meaning("The lock is freed when its session ends."),
    }
}

pub fn map_executor_error(err: ExecutorError) -> CliError {
    let reason = err.to_string();
    let sequence = err.sequence();

    match (err.kind(), err) {
        (ErrorKind::Connection, _) => CliError::connection_error("Connection lost during migration")
            .with_reason(reason)
            .with_meaning("The script in flight was rolled back; every earlier script stays committed.")
            .with_action("Retry `strata migrate`; it resumes after the last committed script."),
        (ErrorKind::ScriptExecution, ExecutorError::ScriptExecution { sequence, statement, .. }) => {
            let meaning = format!(
                "Migration {sequence} was rolled back; the database stays at version {}.",
                sequence - 1
            );
            let mut cli = CliError::migration_failed(format!("Migration {sequence} failed"))
                .with_reason(reason)
                .with_meaning(meaning);
            if let Some(statement) = statement {
                cli = cli.with_action(format!("Fix the failing statement and rerun:\n{statement}"));
            }
            cli
        }
        (ErrorKind::Gap, ExecutorError::Gap(gap)) => map_gap_error(gap),
        (ErrorKind::Gap, _) => CliError::gap_error("Migration sequence gap").with_reason(reason),
        (ErrorKind::Ledger, _) => CliError::user_error("Ledger could not be read")
            .with_reason(reason)
            .with_meaning("The current version of this database is unknown. No script was applied.")
            .with_action("Check that the role can read the ledger table in the configured schema."),
        (ErrorKind::History, _) => CliError::gap_error(modified_title(sequence))
            .with_reason(reason)
            .with_meaning("Applied scripts are immutable. No script was applied.")
            .with_action("Revert the edit and add a new migration for the change instead."),
        (ErrorKind::ScriptExecution, _) => CliError::migration_failed("Migration failed").with_reason(reason),
    }
}

fn modified_title(sequence: Option<i64>) -> String {
    match sequence {
        Some(n) => format!("Applied migration {n} was modified"),
        None => "Applied migration was modified".to_string(),
    }
}

pub fn map_schema_error(err: SchemaError) -> CliError {
    match err {
        SchemaError::Connection { .. } => CliError::connection_error("Connection lost during schema dump")
            .with_reason(err.to_string()),
        SchemaError::UnknownSchema { .. } => CliError::user_error("Unknown schema")
            .with_reason(err.to_string())
            .with_action("Pass an existing schema with --schema."),
        SchemaError::Query { .. } | SchemaError::Write { .. } => {
            CliError::user_error("Schema dump failed").with_reason(err.to_string())
        }
    }
}

pub fn map_harness_error(err: HarnessError) -> CliError {
    match err {
        HarnessError::Drift(drift) => {
            let action = match &drift {
                DriftError::MissingGolden { .. } => "Create it with `strata check --update-golden` and commit it.",
                DriftError::Mismatch { .. } => {
                    "Review the change; if it is intended, rerun with --update-golden and commit the new dump."
                }
            };
            CliError::drift("Schema drift detected")
                .with_reason(drift.to_string())
                .with_meaning("Migrating a fresh database does not reproduce the committed golden dump.")
                .with_action(action)
        }
        HarnessError::Migration(e) => map_executor_error(e),
        HarnessError::Dump(e) => map_schema_error(e),
        HarnessError::Discovery(e) => map_discovery_error(e),
        HarnessError::Config(e) => map_config_error(e),
        err @ HarnessError::Connection { .. } => CliError::connection_error("Harness connection failed")
            .with_reason(err.to_string()),
        err @ HarnessError::Provision { .. } => CliError::user_error("Could not provision the ephemeral database")
            .with_reason(err.to_string())
            .with_action("The --database-url role needs CREATEDB."),
        err @ HarnessError::GoldenUnreadable { .. } => {
            CliError::user_error("Golden dump unreadable").with_reason(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use strata_schema::DumpMismatch;

    #[test]
    fn executor_errors_map_to_taxonomy_exit_codes() {
        let conn = ExecutorError::Connection {
            operation: "begin".to_string(),
            message: "reset".to_string(),
        };
        assert_eq!(map_executor_error(conn).code(), ExitCode::ConnectionError);

        let gap = ExecutorError::Gap(GapError::NonContiguous {
            current_version: 2,
            expected: 3,
            found: 4,
            name: "add_index".to_string(),
        });
        assert_eq!(map_executor_error(gap).exit_code(), 5);

        let history = ExecutorError::ChecksumMismatch {
            sequence: 1,
            recorded: "a".to_string(),
            actual: "b".to_string(),
        };
        let cli = map_executor_error(history);
        assert_eq!(cli.exit_code(), 5);
        assert_eq!(cli.title(), "Applied migration 1 was modified");

        let hole = ExecutorError::Gap(GapError::LedgerHole {
            expected: 2,
            found: 3,
        });
        assert_eq!(map_executor_error(hole).exit_code(), 5);

        let unreadable = ExecutorError::LedgerUnreadable {
            operation: "read ledger entries".to_string(),
            message: "permission denied for table schema_version".to_string(),
        };
        assert_eq!(map_executor_error(unreadable).code(), ExitCode::UserError);

        let script = ExecutorError::ScriptExecution {
            sequence: 7,
            name: "add_column".to_string(),
            statement_ordinal: Some(2),
            statement: Some("ALTER TABLE t ADD COLUMN c int".to_string()),
            message: "relation \"t\" does not exist".to_string(),
        };
        let cli = map_executor_error(script);
        assert_eq!(cli.code(), ExitCode::MigrationFailed);
        assert!(cli.meaning().unwrap().contains("version 6"));
        assert!(cli.action().unwrap().contains("ALTER TABLE t"));
    }

    #[test]
    fn drift_maps_to_its_own_exit_code() {
        let err = HarnessError::Drift(DriftError::Mismatch {
            golden: PathBuf::from("schema/golden.sql"),
            mismatch: DumpMismatch {
                line: 3,
                expected: Some("  column id integer".to_string()),
                actual: Some("  column id bigint".to_string()),
            },
        });
        let cli = map_harness_error(err);
        assert_eq!(cli.exit_code(), 6);
        assert!(cli.reason().unwrap().contains("line 3"));
    }

    #[test]
    fn lock_timeout_is_lock_unavailable() {
        let cli = map_lock_error(LockError::MigrationLockUnavailable { timeout_ms: 10 });
        assert_eq!(cli.exit_code(), 3);
    }
}
