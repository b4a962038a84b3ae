//! The `strata` command line: argument parsing, command dispatch and the
//! mapping from library errors to exit codes.

pub mod args;
pub mod check;
pub mod dump;
pub mod error;
pub mod error_view;
pub mod logging;
pub mod migrate;
pub mod output;
pub mod session;
pub mod status;
pub mod style;
pub mod ui;
pub mod verify;

pub use args::{CheckArgs, Cli, Command, ConnectionArgs, DumpArgs, MigrateArgs, StatusArgs, VerifyArgs};
pub use error::{CliError, ExitCode};

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let connection = &cli.connection;

    match &cli.command {
        Command::Migrate(args) => migrate::run(args, connection).await,
        Command::Status(args) => status::run(args, connection).await,
        Command::Dump(args) => dump::run(args, connection).await,
        Command::Verify(args) => verify::run(args, connection).await,
        Command::Check(args) => check::run(args, connection).await,
    }
}
