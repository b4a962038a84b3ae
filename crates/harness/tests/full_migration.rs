use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Mutex;

use futures::FutureExt;
use sqlx::{Connection, PgConnection};
use strata_config::ConnectionConfig;
use strata_harness::{
    run_full_migration, with_ephemeral_database, DriftError, HarnessConfig, HarnessError,
};

fn admin_config() -> Option<ConnectionConfig> {
    let url = std::env::var("STRATA_TEST_DATABASE_URL").ok()?;
    Some(ConnectionConfig::from_url(&url).expect("valid STRATA_TEST_DATABASE_URL"))
}

fn write_script(dir: &Path, file: &str, sql: &str) {
    std::fs::write(dir.join(file), sql).expect("write script");
}

fn seed_repository(dir: &Path) {
    write_script(
        dir,
        "00001_create_build_table.sql",
        "CREATE TABLE build (id bigint GENERATED ALWAYS AS IDENTITY PRIMARY KEY, label text NOT NULL);",
    );
    write_script(
        dir,
        "00002_create_claction_table.sql",
        "CREATE TYPE claction_state AS ENUM ('open', 'closed');\n\
         CREATE TABLE claction (\n\
             id bigint PRIMARY KEY,\n\
             build_id bigint NOT NULL REFERENCES build (id) ON DELETE CASCADE,\n\
             state claction_state NOT NULL DEFAULT 'open'\n\
         );\n\
         CREATE INDEX claction_build_idx ON claction (build_id);",
    );
}

async fn database_exists(admin: &ConnectionConfig, name: &str) -> bool {
    let mut conn = PgConnection::connect_with(admin.connect_options())
        .await
        .expect("admin connection");
    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(name)
            .fetch_one(&mut conn)
            .await
            .expect("query pg_database");
    exists
}

#[tokio::test]
async fn missing_golden_is_drift_before_any_database_work() {
    // Nothing listens on port 1; the harness must fail before connecting.
    let admin = ConnectionConfig::from_url("postgres://strata@127.0.0.1:1/postgres").unwrap();
    let repo = tempfile::tempdir().unwrap();
    seed_repository(repo.path());
    let golden = repo.path().join("missing").join("schema.sql");

    let err = run_full_migration(&HarnessConfig::new(admin, repo.path(), &golden))
        .await
        .unwrap_err();

    assert_eq!(
        err.drift(),
        Some(&DriftError::MissingGolden { golden: golden.clone() })
    );
}

#[tokio::test]
async fn empty_repository_is_rejected() {
    let admin = ConnectionConfig::from_url("postgres://strata@127.0.0.1:1/postgres").unwrap();
    let repo = tempfile::tempdir().unwrap();

    let config = HarnessConfig::new(admin, repo.path(), repo.path().join("schema.sql"))
        .with_update_golden(true);
    let err = run_full_migration(&config).await.unwrap_err();

    assert!(matches!(err, HarnessError::Discovery(_)), "{err:?}");
}

#[tokio::test]
async fn golden_dump_round_trip_detects_changed_script() {
    let Some(admin) = admin_config() else {
        return;
    };
    let repo = tempfile::tempdir().unwrap();
    seed_repository(repo.path());
    let golden = repo.path().join("schema.sql");

    let update = HarnessConfig::new(admin.clone(), repo.path(), &golden).with_update_golden(true);
    let first = run_full_migration(&update).await.unwrap();
    assert!(first.golden_updated);
    assert_eq!(first.run.version_after, 2);
    assert!(first.dump.contains("table claction"));
    assert!(first.dump.contains("enum claction_state ('open', 'closed')"));
    assert!(!database_exists(&admin, &first.database).await);

    let check = HarnessConfig::new(admin.clone(), repo.path(), &golden);
    let second = run_full_migration(&check).await.unwrap();
    assert!(!second.golden_updated);
    assert_eq!(second.dump, first.dump);

    write_script(
        repo.path(),
        "00001_create_build_table.sql",
        "CREATE TABLE build (id bigint GENERATED ALWAYS AS IDENTITY PRIMARY KEY, label varchar(80) NOT NULL);",
    );
    let err = run_full_migration(&check).await.unwrap_err();
    match err.drift() {
        Some(DriftError::Mismatch { mismatch, .. }) => {
            assert!(mismatch.line > 1);
        }
        other => panic!("expected drift mismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn committed_golden_matches_sample_migrations() {
    let Some(admin) = admin_config() else {
        return;
    };
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    let config = HarnessConfig::new(
        admin,
        root.join("migrations"),
        root.join("schema/golden.sql"),
    );

    let report = run_full_migration(&config).await.unwrap();
    assert!(!report.golden_updated);
    assert_eq!(report.run.version_after, 3);
}

#[tokio::test]
async fn failing_script_still_drops_database() {
    let Some(admin) = admin_config() else {
        return;
    };
    let repo = tempfile::tempdir().unwrap();
    seed_repository(repo.path());
    write_script(repo.path(), "00003_broken.sql", "ALTER TABLE no_such_table ADD COLUMN x int;");

    let config =
        HarnessConfig::new(admin.clone(), repo.path(), repo.path().join("schema.sql"))
            .with_update_golden(true);
    let err = run_full_migration(&config).await.unwrap_err();
    assert!(matches!(err, HarnessError::Migration(_)), "{err:?}");
    assert!(!repo.path().join("schema.sql").exists());
}

#[tokio::test]
async fn panicking_scope_still_drops_database() {
    let Some(admin) = admin_config() else {
        return;
    };
    let seen = Mutex::new(None::<String>);

    let outcome = AssertUnwindSafe(with_ephemeral_database(&admin, |target| {
        *seen.lock().unwrap() = target.database_name().map(str::to_string);
        async move {
            if target.database_name().is_some() {
                panic!("scope panicked");
            }
            Ok::<(), HarnessError>(())
        }
    }))
    .catch_unwind()
    .await;

    assert!(outcome.is_err());
    let name = seen.lock().unwrap().clone().expect("scope ran");
    assert!(!database_exists(&admin, &name).await);
}

#[tokio::test]
async fn erroring_scope_still_drops_database() {
    let Some(admin) = admin_config() else {
        return;
    };
    let seen = Mutex::new(None::<String>);

    let err = with_ephemeral_database(&admin, |target| {
        *seen.lock().unwrap() = target.database_name().map(str::to_string);
        async move {
            Err::<(), _>(HarnessError::Connection {
                operation: "test",
                message: "simulated".to_string(),
            })
        }
    })
    .await
    .unwrap_err();

    assert!(err.is_connection());
    let name = seen.lock().unwrap().clone().expect("scope ran");
    assert!(!database_exists(&admin, &name).await);
}
