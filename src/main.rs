use clap::Parser;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    strata_cli::logging::init();

    let cli = strata_cli::Cli::parse();
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "strata starting");

    if let Err(err) = strata_cli::run(&cli).await {
        tracing::debug!(error = %err, code = err.exit_code(), "command failed");
        strata_cli::error_view::print(&err);
        std::process::exit(err.exit_code());
    }
}
