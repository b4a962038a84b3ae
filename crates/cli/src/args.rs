use core::time::Duration;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use strata_config::{ConfigError, ConnectionConfig};

use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Sequential PostgreSQL schema migrations")]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply pending migrations in sequence order.
    Migrate(MigrateArgs),
    /// Show the ledger version and pending scripts.
    Status(StatusArgs),
    /// Print the canonical structural dump of the database.
    Dump(DumpArgs),
    /// Check the ledger against the script repository without changing anything.
    Verify(VerifyArgs),
    /// Migrate a throwaway database from scratch and compare it with the golden dump.
    Check(CheckArgs),
}

/// Settings shared by every command; each flag can also come from the
/// environment (or a `.env` file).
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[arg(long, global = true, env = "STRATA_MIGRATIONS_DIR", default_value = "migrations")]
    pub migrations_dir: PathBuf,

    #[arg(long, global = true, env = "STRATA_LEDGER_TABLE", default_value = strata_config::DEFAULT_LEDGER_TABLE)]
    pub ledger_table: String,

    #[arg(long, global = true, env = "STRATA_SCHEMA", default_value = strata_config::DEFAULT_SCHEMA)]
    pub schema: String,

    #[arg(long, global = true, env = "STRATA_LOCK_TIMEOUT_MS", default_value_t = 10_000)]
    pub lock_timeout_ms: u64,

    #[arg(long, global = true, env = "STRATA_TRANSACTION_TIMEOUT_SECS", default_value_t = 300)]
    pub transaction_timeout_secs: u64,

    #[arg(long, global = true, env = "STRATA_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,
}

impl ConnectionArgs {
    pub fn connection_config(&self) -> Result<ConnectionConfig, CliError> {
        let url = self.database_url.as_deref().unwrap_or_default();

        let build = || -> Result<ConnectionConfig, ConfigError> {
            Ok(ConnectionConfig::from_url(url)?
                .with_schema(self.schema.clone())?
                .with_ledger_table(self.ledger_table.clone())?
                .with_connect_timeout(Duration::from_secs(self.connect_timeout_secs))?
                .with_transaction_timeout(Duration::from_secs(self.transaction_timeout_secs))?
                .with_lock_timeout(Duration::from_millis(self.lock_timeout_ms)))
        };

        build().map_err(crate::error::map_config_error)
    }
}

#[derive(Args, Debug, Clone)]
pub struct MigrateArgs {
    /// List what would run without opening a transaction.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {}

#[derive(Args, Debug, Clone)]
pub struct DumpArgs {
    /// Write the dump to FILE instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[arg(long, env = "STRATA_GOLDEN_DUMP", default_value = "schema/golden.sql", value_name = "FILE")]
    pub golden: PathBuf,

    /// Rewrite the golden dump from a fresh migration instead of comparing.
    #[arg(long)]
    pub update_golden: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn migrate_dry_run_with_global_flags() {
        let cli = Cli::try_parse_from([
            "strata",
            "migrate",
            "--dry-run",
            "--database-url",
            "postgres://localhost/app",
            "--ledger-table",
            "applied_scripts",
        ])
        .unwrap();

        match cli.command {
            Command::Migrate(args) => assert!(args.dry_run),
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.connection.ledger_table, "applied_scripts");
        assert_eq!(cli.connection.lock_timeout_ms, 10_000);

        let config = cli.connection.connection_config().unwrap();
        assert_eq!(config.ledger_table(), "applied_scripts");
        assert_eq!(config.database_name(), Some("app"));
    }

    #[test]
    fn invalid_ledger_table_is_a_user_error() {
        let cli = Cli::try_parse_from([
            "strata",
            "status",
            "--database-url",
            "postgres://localhost/app",
            "--ledger-table",
            "Robert'); DROP TABLE students;--",
        ])
        .unwrap();

        let err = cli.connection.connection_config().unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
