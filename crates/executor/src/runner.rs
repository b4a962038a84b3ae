use crate::error::ExecutorError;
use crate::mode::ExecutionMode;
use crate::statement::{self, duration_ms, sql_snippet};
use crate::target::{MigrationTarget, TargetError, TargetTransaction};
use core::fmt;
use core::time::Duration;
use strata_migration::{
    check_ledger_prefix, detect_drift, plan_pending, GapError, MigrationDriftError,
    MigrationScript, PendingPlan,
};
use strata_sql::SqlStatement;

pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRef {
    pub sequence: i64,
    pub name: String,
}

impl From<&MigrationScript> for ScriptRef {
    fn from(script: &MigrationScript) -> Self {
        Self {
            sequence: script.sequence,
            name: script.name.clone(),
        }
    }
}

impl fmt::Display for ScriptRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:05}_{}", self.sequence, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub mode: ExecutionMode,
    pub version_before: i64,
    pub version_after: i64,
    /// Scripts that were (or, in a dry run, would be) applied, in order.
    pub pending: Vec<ScriptRef>,
    pub applied: Vec<ScriptRef>,
    pub skipped: usize,
}

impl RunReport {
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }
}

#[derive(Debug, Clone)]
pub struct RunnerOptions {
    pub transaction_timeout: Duration,
    pub verify_checksums: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
            verify_checksums: true,
        }
    }
}

/// Applies pending scripts strictly in sequence order, one transaction per
/// script. Never retries; the caller decides what to do with a failure.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    options: RunnerOptions,
}

impl Runner {
    pub fn new(options: RunnerOptions) -> Self {
        Self { options }
    }

    pub fn with_transaction_timeout(mut self, timeout: Duration) -> Self {
        self.options.transaction_timeout = timeout;
        self
    }

    pub async fn run_with_mode<T: MigrationTarget>(
        &self,
        mode: ExecutionMode,
        target: &mut T,
        scripts: &[MigrationScript],
    ) -> Result<RunReport, ExecutorError> {
        match mode {
            ExecutionMode::Apply => self.apply(target, scripts).await,
            ExecutionMode::DryRun => self.plan(target, scripts).await,
        }
    }

    /// Computes the pending set without opening a transaction.
    pub async fn plan<T: MigrationTarget>(
        &self,
        target: &mut T,
        scripts: &[MigrationScript],
    ) -> Result<RunReport, ExecutorError> {
        let plan = self.validated_plan(target, scripts).await?;

        for script in &plan.pending {
            statement::prepare_statements(script, target.ledger_table())?;
        }

        Ok(RunReport {
            mode: ExecutionMode::DryRun,
            version_before: plan.current_version,
            version_after: plan.current_version,
            pending: plan.pending.iter().map(|s| ScriptRef::from(*s)).collect(),
            applied: Vec::new(),
            skipped: plan.already_applied,
        })
    }

    pub async fn apply<T: MigrationTarget>(
        &self,
        target: &mut T,
        scripts: &[MigrationScript],
    ) -> Result<RunReport, ExecutorError> {
        let plan = self.validated_plan(target, scripts).await?;

        if plan.is_empty() {
            tracing::info!(version = plan.current_version, "database is up to date");
            return Ok(RunReport {
                mode: ExecutionMode::Apply,
                version_before: plan.current_version,
                version_after: plan.current_version,
                pending: Vec::new(),
                applied: Vec::new(),
                skipped: plan.already_applied,
            });
        }

        // Everything is parsed before the first transaction so a malformed
        // later script does not leave the database half way.
        let mut prepared: Vec<(&MigrationScript, Vec<SqlStatement>)> =
            Vec::with_capacity(plan.pending.len());
        for script in &plan.pending {
            let statements = statement::prepare_statements(script, target.ledger_table())?;
            prepared.push((*script, statements));
        }

        tracing::info!(
            from = plan.current_version,
            to = plan.target_version(),
            pending = prepared.len(),
            "applying migrations"
        );

        let mut applied = Vec::with_capacity(prepared.len());
        for (script, statements) in &prepared {
            let started = std::time::Instant::now();
            self.apply_one(target, script, statements).await?;
            tracing::info!(
                sequence = script.sequence,
                name = %script.name,
                elapsed_ms = duration_ms(started.elapsed()),
                "migration applied"
            );
            applied.push(ScriptRef::from(*script));
        }

        let version_after = applied
            .last()
            .map(|s| s.sequence)
            .unwrap_or(plan.current_version);

        Ok(RunReport {
            mode: ExecutionMode::Apply,
            version_before: plan.current_version,
            version_after,
            pending: plan.pending.iter().map(|s| ScriptRef::from(*s)).collect(),
            applied,
            skipped: plan.already_applied,
        })
    }

    async fn validated_plan<'s, T: MigrationTarget>(
        &self,
        target: &mut T,
        scripts: &'s [MigrationScript],
    ) -> Result<PendingPlan<'s>, ExecutorError> {
        let current_version = target
            .current_version()
            .await
            .map_err(|e| target_error("read ledger version", e))?;

        if current_version > 0 {
            let applied = target
                .applied()
                .await
                .map_err(|e| target_error("read ledger entries", e))?;

            // A hand-written row can skip a version; the ledger must still be
            // a prefix of the repository.
            check_ledger_prefix(&applied)?;

            if self.options.verify_checksums {
                detect_drift(scripts, &applied).map_err(|e| match e {
                    MigrationDriftError::MissingScript { sequence, name } => {
                        ExecutorError::Gap(GapError::MissingScript { sequence, name })
                    }
                    MigrationDriftError::ChecksumMismatch {
                        sequence,
                        recorded,
                        actual,
                    } => ExecutorError::ChecksumMismatch {
                        sequence,
                        recorded,
                        actual,
                    },
                })?;
            }
        }

        Ok(plan_pending(scripts, current_version)?)
    }

    async fn apply_one<T: MigrationTarget>(
        &self,
        target: &mut T,
        script: &MigrationScript,
        statements: &[SqlStatement],
    ) -> Result<(), ExecutorError> {
        let timeout = self.options.transaction_timeout;

        let work = async {
            let mut tx = target
                .begin(timeout)
                .await
                .map_err(|e| script_error(script, None, None, e))?;

            for stmt in statements {
                tracing::debug!(
                    sequence = script.sequence,
                    ordinal = stmt.ordinal,
                    statement = %sql_snippet(&stmt.sql),
                    "executing statement"
                );

                if let Err(e) = tx.execute(&stmt.sql).await {
                    let err = script_error(script, Some(stmt.ordinal), Some(&stmt.sql), e);
                    rollback_quietly(tx, script).await;
                    return Err(err);
                }
            }

            if let Err(e) = tx.record(script).await {
                let err = script_error(script, None, None, e);
                rollback_quietly(tx, script).await;
                return Err(err);
            }

            tx.commit()
                .await
                .map_err(|e| script_error(script, None, None, e))
        };

        match tokio::time::timeout(timeout, work).await {
            Ok(result) => result,
            // The transaction was dropped mid-flight, which rolls it back.
            Err(_) => Err(ExecutorError::Connection {
                operation: format!("apply migration {}", script.sequence),
                message: format!(
                    "transaction did not finish within {}ms",
                    duration_ms(timeout)
                ),
            }),
        }
    }
}

async fn rollback_quietly<X: TargetTransaction>(tx: X, script: &MigrationScript) {
    if let Err(e) = tx.rollback().await {
        tracing::warn!(
            sequence = script.sequence,
            error = %e,
            "rollback after failed migration did not complete"
        );
    }
}

fn target_error(operation: &str, err: TargetError) -> ExecutorError {
    let message = err.to_string();
    match err {
        TargetError::Connection { .. } => ExecutorError::Connection {
            operation: operation.to_string(),
            message,
        },
        TargetError::Statement { .. } => ExecutorError::LedgerUnreadable {
            operation: operation.to_string(),
            message,
        },
    }
}

fn script_error(
    script: &MigrationScript,
    ordinal: Option<i32>,
    sql: Option<&str>,
    err: TargetError,
) -> ExecutorError {
    match err {
        TargetError::Connection { message } => ExecutorError::Connection {
            operation: format!("apply migration {}", script.sequence),
            message,
        },
        TargetError::Statement { message } => ExecutorError::ScriptExecution {
            sequence: script.sequence,
            name: script.name.clone(),
            statement_ordinal: ordinal,
            statement: sql.map(sql_snippet),
            message,
        },
    }
}
