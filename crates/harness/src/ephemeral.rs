use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use sqlx::{Connection, PgConnection};
use strata_config::ConnectionConfig;
use uuid::Uuid;

use crate::error::HarnessError;

pub const EPHEMERAL_DATABASE_PREFIX: &str = "strata_harness_";

/// A throwaway database on the admin connection's server.
#[derive(Debug)]
pub struct EphemeralDatabase {
    name: String,
    config: ConnectionConfig,
}

impl EphemeralDatabase {
    pub async fn create(admin: &ConnectionConfig) -> Result<Self, HarnessError> {
        let name = ephemeral_database_name();
        let mut conn = admin_connection(admin).await?;

        sqlx::raw_sql(&format!("CREATE DATABASE \"{name}\""))
            .execute(&mut conn)
            .await
            .map_err(|e| HarnessError::provision("create", &name, &e))?;

        close_quietly(conn).await;
        tracing::info!(database = %name, "ephemeral database created");

        Ok(Self {
            config: admin.for_database(&name),
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration pointing at the ephemeral database; schema, ledger and
    /// timeouts are inherited from the admin configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Drops the database, terminating any sessions still attached to it.
    pub async fn drop_database(self, admin: &ConnectionConfig) -> Result<(), HarnessError> {
        let mut conn = admin_connection(admin).await?;

        sqlx::raw_sql(&format!(
            "DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)",
            self.name
        ))
        .execute(&mut conn)
        .await
        .map_err(|e| HarnessError::provision("drop", &self.name, &e))?;

        close_quietly(conn).await;
        tracing::info!(database = %self.name, "ephemeral database dropped");

        Ok(())
    }
}

/// Runs `f` against a fresh database and drops that database afterwards,
/// whether `f` returns `Ok`, returns `Err` or panics. A panic is resumed once
/// teardown has been attempted.
pub async fn with_ephemeral_database<F, Fut, T>(
    admin: &ConnectionConfig,
    f: F,
) -> Result<T, HarnessError>
where
    F: FnOnce(ConnectionConfig) -> Fut,
    Fut: Future<Output = Result<T, HarnessError>>,
{
    let database = EphemeralDatabase::create(admin).await?;
    let name = database.name().to_string();

    let outcome = AssertUnwindSafe(f(database.config().clone()))
        .catch_unwind()
        .await;

    let teardown = database.drop_database(admin).await;
    if let Err(err) = &teardown {
        tracing::warn!(database = %name, error = %err, "ephemeral database teardown failed");
    }

    match outcome {
        Err(panic) => std::panic::resume_unwind(panic),
        Ok(Err(err)) => Err(err),
        Ok(Ok(value)) => teardown.map(|()| value),
    }
}

pub fn ephemeral_database_name() -> String {
    format!("{EPHEMERAL_DATABASE_PREFIX}{}", Uuid::new_v4().simple())
}

async fn admin_connection(admin: &ConnectionConfig) -> Result<PgConnection, HarnessError> {
    let connect = PgConnection::connect_with(admin.connect_options());

    match tokio::time::timeout(admin.connect_timeout(), connect).await {
        Ok(Ok(conn)) => Ok(conn),
        Ok(Err(e)) => Err(HarnessError::from_sqlx("admin connect", &e)),
        Err(_) => Err(HarnessError::Connection {
            operation: "admin connect",
            message: format!(
                "timed out after {}s",
                admin.connect_timeout().as_secs()
            ),
        }),
    }
}

async fn close_quietly(conn: PgConnection) {
    if let Err(err) = conn.close().await {
        tracing::debug!(error = %err, "admin connection did not close cleanly");
    }
}
