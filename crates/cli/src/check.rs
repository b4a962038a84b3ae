use strata_harness::{run_full_migration, HarnessConfig};

use crate::args::{CheckArgs, ConnectionArgs};
use crate::error::{map_harness_error, CliError};
use crate::output;
use crate::style::Style;
use crate::ui::Ui;

/// `--database-url` is used as the admin connection: the harness creates and
/// drops its own database on that server.
pub async fn run(args: &CheckArgs, connection: &ConnectionArgs) -> Result<(), CliError> {
    let admin = connection.connection_config()?;
    let config = HarnessConfig::new(admin, &connection.migrations_dir, &args.golden)
        .with_update_golden(args.update_golden);

    let report = run_full_migration(&config)
        .await
        .map_err(map_harness_error)?;

    let ui = Ui::new(Style::detect());
    for line in ui.header("Strata check") {
        output::line(line);
    }
    output::line(ui.kv("ephemeral database", &report.database));
    output::line(ui.kv("migrations applied", &report.run.applied_count().to_string()));
    output::line(ui.kv("golden dump", &args.golden.display().to_string()));
    output::line(ui.footer());

    let summary = if report.golden_updated {
        "golden dump updated"
    } else {
        "schema matches the golden dump"
    };
    output::line(ui.ok_line(summary));

    Ok(())
}
