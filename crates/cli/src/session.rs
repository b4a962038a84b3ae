use std::path::Path;

use sqlx::PgPool;
use strata_config::ConnectionConfig;
use strata_ledger::{LedgerEntry, PgLedger};
use strata_migration::{discover_migrations, MigrationScript};

use crate::error::{map_connect_error, map_discovery_error, map_ledger_error, CliError};

pub async fn connect(config: &ConnectionConfig) -> Result<PgPool, CliError> {
    config.connect_pool().await.map_err(map_connect_error)
}

pub fn load_scripts(dir: &Path) -> Result<Vec<MigrationScript>, CliError> {
    let scripts = discover_migrations(dir).map_err(map_discovery_error)?;
    tracing::debug!(dir = %dir.display(), scripts = scripts.len(), "script repository loaded");
    Ok(scripts)
}

pub async fn ledger_entries(
    pool: &PgPool,
    ledger: &PgLedger,
) -> Result<Vec<LedgerEntry>, CliError> {
    let mut conn = pool.acquire().await.map_err(map_connect_error)?;
    ledger.entries(&mut conn).await.map_err(map_ledger_error)
}
