//! Explicit connection configuration shared by every strata component.
//!
//! Nothing in the workspace reads process-wide settings on its own; the binary
//! builds one [`ConnectionConfig`] and hands it down.

mod error;
mod identifier;

use core::str::FromStr;
use core::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

pub use error::ConfigError;
pub use identifier::validate_identifier;

pub const DEFAULT_LEDGER_TABLE: &str = "schema_version";
pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(10_000);

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    options: PgConnectOptions,
    schema: String,
    ledger_table: String,
    connect_timeout: Duration,
    transaction_timeout: Duration,
    lock_timeout: Duration,
}

impl ConnectionConfig {
    pub fn from_url(database_url: &str) -> Result<Self, ConfigError> {
        let database_url = database_url.trim();
        if database_url.is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        let options =
            PgConnectOptions::from_str(database_url).map_err(|e| ConfigError::InvalidDatabaseUrl {
                message: e.to_string(),
            })?;

        Ok(Self::from_options(options))
    }

    pub fn from_options(options: PgConnectOptions) -> Self {
        Self {
            options,
            schema: DEFAULT_SCHEMA.to_string(),
            ledger_table: DEFAULT_LEDGER_TABLE.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Result<Self, ConfigError> {
        let schema = schema.into();
        validate_identifier("schema", &schema)?;
        self.schema = schema;
        Ok(self)
    }

    pub fn with_ledger_table(mut self, table: impl Into<String>) -> Result<Self, ConfigError> {
        let table = table.into();
        validate_identifier("ledger table", &table)?;
        self.ledger_table = table;
        Ok(self)
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        non_zero("connect timeout", timeout)?;
        self.connect_timeout = timeout;
        Ok(self)
    }

    pub fn with_transaction_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        non_zero("transaction timeout", timeout)?;
        self.transaction_timeout = timeout;
        Ok(self)
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Same server and credentials, different database. Used to point at an
    /// ephemeral database created through an admin connection.
    pub fn for_database(&self, database: &str) -> Self {
        let mut next = self.clone();
        next.options = next.options.database(database);
        next
    }

    pub fn connect_options(&self) -> &PgConnectOptions {
        &self.options
    }

    pub fn database_name(&self) -> Option<&str> {
        self.options.get_database()
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn ledger_table(&self) -> &str {
        &self.ledger_table
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn transaction_timeout(&self) -> Duration {
        self.transaction_timeout
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    pub async fn connect_pool(&self) -> Result<PgPool, sqlx::Error> {
        tracing::debug!(
            host = self.options.get_host(),
            database = self.database_name().unwrap_or("<default>"),
            "connecting to database"
        );

        PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(self.connect_timeout)
            .connect_with(self.options.clone())
            .await
    }
}

fn non_zero(what: &'static str, d: Duration) -> Result<(), ConfigError> {
    if d.is_zero() {
        return Err(ConfigError::ZeroDuration { what });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_url_is_missing() {
        let err = ConnectionConfig::from_url("   ").unwrap_err();
        assert_eq!(err, ConfigError::MissingDatabaseUrl);
    }

    #[test]
    fn defaults_are_applied() {
        let cfg = ConnectionConfig::from_url("postgres://u:p@localhost:5432/builds").unwrap();
        assert_eq!(cfg.database_name(), Some("builds"));
        assert_eq!(cfg.schema(), "public");
        assert_eq!(cfg.ledger_table(), "schema_version");
        assert_eq!(cfg.transaction_timeout(), DEFAULT_TRANSACTION_TIMEOUT);
    }

    #[test]
    fn for_database_keeps_everything_else() {
        let cfg = ConnectionConfig::from_url("postgres://u:p@localhost:5432/postgres")
            .unwrap()
            .with_ledger_table("cidb_version")
            .unwrap();

        let other = cfg.for_database("scratch");
        assert_eq!(other.database_name(), Some("scratch"));
        assert_eq!(other.ledger_table(), "cidb_version");
        assert_eq!(cfg.database_name(), Some("postgres"));
    }

    #[test]
    fn invalid_names_and_timeouts_are_rejected() {
        let cfg = ConnectionConfig::from_url("postgres://localhost/x").unwrap();
        assert!(cfg.clone().with_ledger_table("Bad Name").is_err());
        assert!(cfg.clone().with_schema("").is_err());
        assert_eq!(
            cfg.with_transaction_timeout(Duration::ZERO).unwrap_err(),
            ConfigError::ZeroDuration {
                what: "transaction timeout"
            }
        );
    }
}
