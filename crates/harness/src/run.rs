use std::path::{Path, PathBuf};

use strata_config::{validate_identifier, ConnectionConfig};
use strata_executor::{PgTarget, RunReport, Runner};
use strata_ledger::PgLedger;
use strata_migration::discover_migrations;
use strata_schema::{compare_dumps, write_dump};

use crate::ephemeral::with_ephemeral_database;
use crate::error::{DriftError, HarnessError};

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Connection with rights to create and drop databases.
    pub admin: ConnectionConfig,
    pub migrations_dir: PathBuf,
    pub golden_dump: PathBuf,
    pub schema: String,
    /// Write the fresh dump to `golden_dump` instead of comparing against it.
    pub update_golden: bool,
}

impl HarnessConfig {
    pub fn new(
        admin: ConnectionConfig,
        migrations_dir: impl Into<PathBuf>,
        golden_dump: impl Into<PathBuf>,
    ) -> Self {
        Self {
            schema: admin.schema().to_string(),
            admin,
            migrations_dir: migrations_dir.into(),
            golden_dump: golden_dump.into(),
            update_golden: false,
        }
    }

    pub fn with_update_golden(mut self, update_golden: bool) -> Self {
        self.update_golden = update_golden;
        self
    }
}

#[derive(Debug, Clone)]
pub struct HarnessReport {
    pub database: String,
    pub run: RunReport,
    pub dump: String,
    pub golden_updated: bool,
}

/// Builds a fresh database from the whole script repository, dumps it and
/// checks the dump against the golden file.
///
/// The ephemeral database is dropped before this returns, including when
/// migration or dumping fails.
pub async fn run_full_migration(config: &HarnessConfig) -> Result<HarnessReport, HarnessError> {
    validate_identifier("schema", &config.schema)?;

    let scripts = discover_migrations(&config.migrations_dir)?;
    let golden = if config.update_golden {
        None
    } else {
        Some(read_golden(&config.golden_dump)?)
    };

    tracing::info!(
        scripts = scripts.len(),
        golden = %config.golden_dump.display(),
        "running full migration against ephemeral database"
    );

    let scripts = &scripts;
    let (database, run, dump) = with_ephemeral_database(&config.admin, |target| async move {
        let database = target.database_name().unwrap_or_default().to_string();
        let pool = target
            .connect_pool()
            .await
            .map_err(|e| HarnessError::from_sqlx("connect", &e))?;

        let outcome = async {
            let mut pg = PgTarget::new(pool.clone(), PgLedger::from_config(&target));
            let run = Runner::default()
                .with_transaction_timeout(target.transaction_timeout())
                .apply(&mut pg, scripts)
                .await?;
            let dump = strata_schema::dump(&pool, &config.schema).await?;
            Ok::<_, HarnessError>((run, dump))
        }
        .await;

        pool.close().await;
        let (run, dump) = outcome?;
        Ok::<_, HarnessError>((database, run, dump))
    })
    .await?;

    let golden_updated = match golden {
        None => {
            write_dump(&config.golden_dump, &dump)?;
            tracing::info!(golden = %config.golden_dump.display(), "golden dump updated");
            true
        }
        Some(expected) => {
            if let Some(mismatch) = compare_dumps(&expected, &dump) {
                return Err(DriftError::Mismatch {
                    golden: config.golden_dump.clone(),
                    mismatch,
                }
                .into());
            }
            false
        }
    };

    Ok(HarnessReport {
        database,
        run,
        dump,
        golden_updated,
    })
}

fn read_golden(path: &Path) -> Result<String, HarnessError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DriftError::MissingGolden {
            golden: path.to_path_buf(),
        }
        .into()),
        Err(e) => Err(HarnessError::GoldenUnreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}
