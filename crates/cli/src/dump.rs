use strata_schema::write_dump;

use crate::args::{ConnectionArgs, DumpArgs};
use crate::error::{map_schema_error, CliError};
use crate::output;
use crate::session;
use crate::style::Style;
use crate::ui::Ui;

pub async fn run(args: &DumpArgs, connection: &ConnectionArgs) -> Result<(), CliError> {
    let config = connection.connection_config()?;
    let pool = session::connect(&config).await?;

    let text = strata_schema::dump(&pool, config.schema()).await;
    pool.close().await;
    let text = text.map_err(map_schema_error)?;

    match &args.output {
        Some(path) => {
            write_dump(path, &text).map_err(map_schema_error)?;
            let ui = Ui::new(Style::detect());
            output::line(ui.ok_line(&format!("dump written to {}", path.display())));
        }
        None => output::raw(&text),
    }

    Ok(())
}
