use crate::target::{MigrationTarget, TargetError, TargetTransaction};
use core::time::Duration;
use sqlx::{PgPool, Postgres, Transaction};
use strata_ledger::{is_connection_error, LedgerError, PgLedger};
use strata_migration::{AppliedMigration, MigrationScript};

/// PostgreSQL target backed by a pool. DDL is transactional in PostgreSQL, so
/// a script and its ledger row commit or vanish together.
#[derive(Clone)]
pub struct PgTarget {
    pool: PgPool,
    ledger: PgLedger,
}

impl PgTarget {
    pub fn new(pool: PgPool, ledger: PgLedger) -> Self {
        Self { pool, ledger }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn ledger(&self) -> &PgLedger {
        &self.ledger
    }

    async fn acquire(&self) -> Result<sqlx::pool::PoolConnection<Postgres>, TargetError> {
        self.pool.acquire().await.map_err(|e| from_sqlx(&e))
    }
}

pub struct PgTargetTransaction<'a> {
    tx: Transaction<'static, Postgres>,
    ledger: &'a PgLedger,
}

impl MigrationTarget for PgTarget {
    type Transaction<'a> = PgTargetTransaction<'a>
    where
        Self: 'a;

    fn ledger_table(&self) -> &str {
        self.ledger.table()
    }

    async fn ledger_exists(&mut self) -> Result<bool, TargetError> {
        let mut conn = self.acquire().await?;
        self.ledger.exists(&mut conn).await.map_err(from_ledger)
    }

    async fn current_version(&mut self) -> Result<i64, TargetError> {
        let mut conn = self.acquire().await?;
        self.ledger.current_version(&mut conn).await.map_err(from_ledger)
    }

    async fn applied(&mut self) -> Result<Vec<AppliedMigration>, TargetError> {
        let mut conn = self.acquire().await?;
        let entries = self.ledger.entries(&mut conn).await.map_err(from_ledger)?;
        Ok(entries.iter().map(AppliedMigration::from).collect())
    }

    async fn begin(&mut self, timeout: Duration) -> Result<Self::Transaction<'_>, TargetError> {
        let mut tx = self.pool.begin().await.map_err(|e| from_sqlx(&e))?;

        // SET does not take bind parameters.
        let timeout_ms = timeout.as_millis().max(1);
        sqlx::query(&format!("SET LOCAL statement_timeout = {timeout_ms}"))
            .execute(&mut *tx)
            .await
            .map_err(|e| from_sqlx(&e))?;

        Ok(PgTargetTransaction {
            tx,
            ledger: &self.ledger,
        })
    }
}

impl TargetTransaction for PgTargetTransaction<'_> {
    async fn execute(&mut self, sql: &str) -> Result<(), TargetError> {
        sqlx::raw_sql(sql)
            .execute(&mut *self.tx)
            .await
            .map(|_| ())
            .map_err(|e| from_sqlx(&e))
    }

    async fn record(&mut self, script: &MigrationScript) -> Result<(), TargetError> {
        self.ledger
            .record(&mut self.tx, script)
            .await
            .map_err(from_ledger)
    }

    async fn commit(self) -> Result<(), TargetError> {
        self.tx.commit().await.map_err(|e| from_sqlx(&e))
    }

    async fn rollback(self) -> Result<(), TargetError> {
        self.tx.rollback().await.map_err(|e| from_sqlx(&e))
    }
}

fn from_sqlx(err: &sqlx::Error) -> TargetError {
    let message = err.to_string();
    if is_connection_error(err) {
        TargetError::Connection { message }
    } else {
        TargetError::Statement { message }
    }
}

fn from_ledger(err: LedgerError) -> TargetError {
    let message = err.to_string();
    if err.is_connection() {
        TargetError::Connection { message }
    } else {
        TargetError::Statement { message }
    }
}
