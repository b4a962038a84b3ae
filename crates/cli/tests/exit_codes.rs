use clap::Parser;
use strata_cli::{run, Cli, ExitCode};

// Nothing listens on port 1, so any attempt to connect would surface as a
// connection error instead of the code asserted below.
const UNREACHABLE_URL: &str = "postgres://strata@127.0.0.1:1/app";

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("strata").chain(args.iter().copied())).unwrap()
}

#[tokio::test]
async fn empty_database_url_is_a_user_error() {
    let cli = parse(&["status", "--database-url", ""]);
    let err = run(&cli).await.unwrap_err();
    assert_eq!(err.code(), ExitCode::UserError);
    assert!(err.action().unwrap().contains("DATABASE_URL"));
}

#[tokio::test]
async fn malformed_script_name_fails_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("create_users.sql"), "CREATE TABLE users (id int);").unwrap();

    let cli = parse(&[
        "migrate",
        "--database-url",
        UNREACHABLE_URL,
        "--migrations-dir",
        dir.path().to_str().unwrap(),
    ]);
    let err = run(&cli).await.unwrap_err();
    assert_eq!(err.code(), ExitCode::UserError);
    assert_eq!(err.title(), "Migration discovery failed");
}

#[tokio::test]
async fn check_without_golden_reports_drift() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("00001_create_users.sql"), "CREATE TABLE users (id int);").unwrap();
    let golden = dir.path().join("golden.sql");

    let cli = parse(&[
        "check",
        "--database-url",
        UNREACHABLE_URL,
        "--migrations-dir",
        dir.path().to_str().unwrap(),
        "--golden",
        golden.to_str().unwrap(),
    ]);
    let err = run(&cli).await.unwrap_err();
    assert_eq!(err.code(), ExitCode::Drift);
    assert!(err.action().unwrap().contains("--update-golden"));
}

#[tokio::test]
async fn unreachable_database_is_a_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("00001_create_users.sql"), "CREATE TABLE users (id int);").unwrap();

    let cli = parse(&[
        "verify",
        "--database-url",
        UNREACHABLE_URL,
        "--migrations-dir",
        dir.path().to_str().unwrap(),
        "--connect-timeout-secs",
        "1",
    ]);
    let err = run(&cli).await.unwrap_err();
    assert_eq!(err.code(), ExitCode::ConnectionError);
}
