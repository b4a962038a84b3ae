use strata_executor::{ExecutionMode, PgTarget, RunReport, Runner};
use strata_ledger::PgLedger;
use strata_lock::AdvisoryLockGuard;

use crate::args::{ConnectionArgs, MigrateArgs};
use crate::error::{map_executor_error, map_lock_error, CliError};
use crate::output;
use crate::session;
use crate::style::{Mark, Style};
use crate::ui::Ui;

pub async fn run(args: &MigrateArgs, connection: &ConnectionArgs) -> Result<(), CliError> {
    let config = connection.connection_config()?;
    let scripts = session::load_scripts(&connection.migrations_dir)?;
    let pool = session::connect(&config).await?;

    let ledger = PgLedger::from_config(&config);
    let ledger_name = ledger.qualified_name();
    let mut target = PgTarget::new(pool.clone(), ledger);
    let runner = Runner::default().with_transaction_timeout(config.transaction_timeout());

    let mode = ExecutionMode::from_dry_run(args.dry_run);

    let result = match mode {
        ExecutionMode::DryRun => runner.plan(&mut target, &scripts).await,
        ExecutionMode::Apply => {
            let guard = AdvisoryLockGuard::acquire(&config)
                .await
                .map_err(map_lock_error)?;
            tracing::debug!(key = guard.key(), "holding migration lock");

            let result = runner.apply(&mut target, &scripts).await;

            // The lock goes back on every path; a release failure only
            // surfaces when the run itself succeeded.
            match (guard.release().await, &result) {
                (Err(err), Ok(_)) => return Err(map_lock_error(err)),
                (Err(err), Err(_)) => tracing::warn!(error = %err, "failed to release migration lock"),
                (Ok(()), _) => {}
            }

            result
        }
    };

    pool.close().await;
    let report = result.map_err(map_executor_error)?;

    print_report(&report, config.database_name().unwrap_or("<default>"), &ledger_name);
    Ok(())
}

fn print_report(report: &RunReport, database: &str, ledger: &str) {
    let ui = Ui::new(Style::detect());

    for line in ui.header(&format!("Strata migrate ({})", report.mode)) {
        output::line(line);
    }
    output::line(ui.kv("database", database));
    output::line(ui.kv("ledger", ledger));
    output::line(ui.kv(
        "version",
        &format!("{} -> {}", report.version_before, report.version_after),
    ));
    output::line(ui.kv("already applied", &report.skipped.to_string()));

    match report.mode {
        ExecutionMode::DryRun => {
            for script in &report.pending {
                output::line(ui.script_line(&script.to_string(), Mark::Pending, None));
            }
        }
        ExecutionMode::Apply => {
            for script in &report.applied {
                output::line(ui.script_line(&script.to_string(), Mark::Applied, None));
            }
        }
    }
    output::line(ui.footer());

    let summary = match (report.mode, report.pending.len(), report.applied_count()) {
        (_, 0, _) => ui.ok_line("Database is up to date"),
        (ExecutionMode::DryRun, n, _) => ui.info_line(&format!("{n} migration(s) would be applied")),
        (ExecutionMode::Apply, _, n) => ui.ok_line(&format!("{n} migration(s) applied")),
    };
    output::line(summary);
}
