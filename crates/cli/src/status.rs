use strata_ledger::PgLedger;
use strata_migration::plan_pending;

use crate::args::{ConnectionArgs, StatusArgs};
use crate::error::{map_gap_error, CliError};
use crate::output;
use crate::session;
use crate::style::{Mark, Style};
use crate::ui::Ui;

pub async fn run(_args: &StatusArgs, connection: &ConnectionArgs) -> Result<(), CliError> {
    let config = connection.connection_config()?;
    let scripts = session::load_scripts(&connection.migrations_dir)?;
    let pool = session::connect(&config).await?;

    let ledger = PgLedger::from_config(&config);
    let entries = session::ledger_entries(&pool, &ledger).await;
    pool.close().await;
    let entries = entries?;

    let current_version = entries.last().map(|e| e.sequence).unwrap_or(0);
    let plan = plan_pending(&scripts, current_version).map_err(map_gap_error)?;

    let ui = Ui::new(Style::detect());
    for line in ui.header("Strata status") {
        output::line(line);
    }
    output::line(ui.kv("database", config.database_name().unwrap_or("<default>")));
    output::line(ui.kv("ledger", &ledger.qualified_name()));
    output::line(ui.kv("current_version", &current_version.to_string()));
    output::line(ui.kv("applied", &entries.len().to_string()));
    output::line(ui.kv("pending", &plan.pending.len().to_string()));

    let last_applied = match entries.last() {
        Some(entry) => format!(
            "{:05}_{} at {}",
            entry.sequence,
            entry.name,
            entry.applied_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => "none".to_string(),
    };
    output::line(ui.kv("last_applied", &last_applied));

    for script in &plan.pending {
        output::line(ui.script_line(&script.filename, Mark::Pending, Some("pending")));
    }
    output::line(ui.footer());

    Ok(())
}
