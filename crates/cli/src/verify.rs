use strata_ledger::PgLedger;
use strata_migration::{
    check_ledger_prefix, detect_drift, plan_pending, AppliedMigration, MigrationScript,
};

use crate::args::{ConnectionArgs, VerifyArgs};
use crate::error::{map_drift_error, map_gap_error, CliError};
use crate::output;
use crate::session;
use crate::style::Style;
use crate::ui::Ui;

/// Read-only consistency check: the ledger is a hole-free prefix of the
/// repository, every row has an unchanged script, and the pending scripts
/// continue the sequence without a gap.
pub async fn run(_args: &VerifyArgs, connection: &ConnectionArgs) -> Result<(), CliError> {
    let config = connection.connection_config()?;
    let scripts = session::load_scripts(&connection.migrations_dir)?;
    let pool = session::connect(&config).await?;

    let ledger = PgLedger::from_config(&config);
    let entries = session::ledger_entries(&pool, &ledger).await;
    pool.close().await;
    let entries = entries?;

    let applied: Vec<AppliedMigration> = entries.iter().map(AppliedMigration::from).collect();
    let (current_version, pending) = check_consistency(&scripts, &applied)?;

    let unverified = applied.iter().filter(|a| a.checksum.is_none()).count();
    if unverified > 0 {
        tracing::warn!(rows = unverified, "ledger rows without checksum were not verified");
    }

    let ui = Ui::new(Style::detect());
    output::line(ui.ok_line(&format!(
        "ledger at version {current_version} matches the repository ({} applied, {} pending)",
        applied.len(),
        pending
    )));

    Ok(())
}

/// Returns the ledger version and how many scripts are still pending.
fn check_consistency(
    scripts: &[MigrationScript],
    applied: &[AppliedMigration],
) -> Result<(i64, usize), CliError> {
    check_ledger_prefix(applied).map_err(map_gap_error)?;
    detect_drift(scripts, applied).map_err(map_drift_error)?;

    let current_version = applied.iter().map(|a| a.sequence).max().unwrap_or(0);
    let plan = plan_pending(scripts, current_version).map_err(map_gap_error)?;

    Ok((current_version, plan.pending.len()))
}

#[cfg(test)]
mod tests {
    use super::check_consistency;
    use crate::error::ExitCode;
    use strata_migration::{AppliedMigration, MigrationScript};

    fn repo() -> Vec<MigrationScript> {
        (1..=3)
            .map(|n| MigrationScript::new(n, format!("step_{n}"), format!("SELECT {n};")))
            .collect()
    }

    fn row(script: &MigrationScript, with_checksum: bool) -> AppliedMigration {
        AppliedMigration {
            sequence: script.sequence,
            name: script.name.clone(),
            checksum: with_checksum.then(|| script.checksum.clone()),
        }
    }

    #[test]
    fn prefix_ledger_is_consistent() {
        let scripts = repo();
        let applied = vec![row(&scripts[0], true), row(&scripts[1], false)];
        assert_eq!(check_consistency(&scripts, &applied).unwrap(), (2, 1));
    }

    #[test]
    fn ledger_with_a_hole_fails_verification() {
        let scripts = repo();
        let applied = vec![row(&scripts[0], false), row(&scripts[2], false)];
        let err = check_consistency(&scripts, &applied).unwrap_err();
        assert_eq!(err.code(), ExitCode::GapError);
        assert!(err.reason().unwrap().contains("version 2 was never recorded"));
    }
}
