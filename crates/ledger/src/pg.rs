use crate::entry::LedgerEntry;
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use strata_config::{validate_identifier, ConnectionConfig};
use strata_migration::MigrationScript;

/// The version ledger stored in the target database itself.
///
/// Every method takes the connection to use, so `record` runs on the
/// transaction that also executes the script it records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgLedger {
    schema: String,
    table: String,
}

impl PgLedger {
    pub fn new(schema: &str, table: &str) -> Result<Self, LedgerError> {
        for (what, value) in [("schema", schema), ("ledger table", table)] {
            validate_identifier(what, value).map_err(|e| LedgerError::InvalidConfig {
                message: e.to_string(),
            })?;
        }

        Ok(Self {
            schema: schema.to_string(),
            table: table.to_string(),
        })
    }

    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self {
            schema: config.schema().to_string(),
            table: config.ledger_table().to_string(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    pub fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    sequence BIGINT NOT NULL PRIMARY KEY,\n    name TEXT,\n    applied_at TIMESTAMPTZ NOT NULL DEFAULT now(),\n    checksum TEXT\n)",
            self.qualified_name()
        )
    }

    pub async fn exists(&self, conn: &mut PgConnection) -> Result<bool, LedgerError> {
        let row: (bool,) = sqlx::query_as("SELECT to_regclass($1) IS NOT NULL")
            .bind(self.qualified_name())
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| LedgerError::from_sqlx("exists", &e))?;

        Ok(row.0)
    }

    /// Highest recorded sequence; 0 when the ledger table does not exist yet.
    pub async fn current_version(&self, conn: &mut PgConnection) -> Result<i64, LedgerError> {
        if !self.exists(&mut *conn).await? {
            return Ok(0);
        }

        let sql = format!("SELECT COALESCE(MAX(sequence), 0) FROM {}", self.qualified_name());
        let row: (i64,) = sqlx::query_as(&sql)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| LedgerError::from_sqlx("current_version", &e))?;

        Ok(row.0)
    }

    pub async fn entries(&self, conn: &mut PgConnection) -> Result<Vec<LedgerEntry>, LedgerError> {
        if !self.exists(&mut *conn).await? {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT sequence, COALESCE(name, ''), applied_at, checksum FROM {} ORDER BY sequence",
            self.qualified_name()
        );
        let rows: Vec<(i64, String, DateTime<Utc>, Option<String>)> = sqlx::query_as(&sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| LedgerError::from_sqlx("entries", &e))?;

        Ok(rows
            .into_iter()
            .map(|(sequence, name, applied_at, checksum)| LedgerEntry {
                sequence,
                name,
                applied_at,
                checksum,
            })
            .collect())
    }

    /// Records `script` as applied, creating the ledger table first when this
    /// is the first script ever applied to the database.
    pub async fn record(
        &self,
        conn: &mut PgConnection,
        script: &MigrationScript,
    ) -> Result<(), LedgerError> {
        if !self.exists(&mut *conn).await? {
            tracing::info!(
                ledger = %self.qualified_name(),
                sequence = script.sequence,
                "creating ledger table"
            );
            sqlx::query(&self.create_table_sql())
                .execute(&mut *conn)
                .await
                .map_err(|e| LedgerError::from_sqlx("bootstrap", &e))?;
        }

        let sql = format!(
            "INSERT INTO {} (sequence, name, applied_at, checksum) VALUES ($1, $2, now(), $3)",
            self.qualified_name()
        );
        sqlx::query(&sql)
            .bind(script.sequence)
            .bind(&script.name)
            .bind(&script.checksum)
            .execute(&mut *conn)
            .await
            .map_err(|e| LedgerError::from_sqlx("record", &e))?;

        Ok(())
    }
}
