use crate::advisory;
use crate::error::LockError;
use core::time::Duration;
use sqlx::{Connection, PgConnection};
use strata_config::ConnectionConfig;
use tokio::time::{sleep, Instant};

/// Session-level advisory lock held on a dedicated connection.
///
/// Dropping the guard without [`release`](Self::release) closes the socket,
/// which also frees the lock server-side.
pub struct AdvisoryLockGuard {
    conn: Option<PgConnection>,
    key: i64,
}

impl AdvisoryLockGuard {
    pub async fn acquire(config: &ConnectionConfig) -> Result<Self, LockError> {
        let timeout = config.lock_timeout();
        let mut conn = PgConnection::connect_with(config.connect_options())
            .await
            .map_err(|e| LockError::LockAcquireFailed {
                message: format!("connect failed: {e}"),
            })?;

        let db_name = advisory::current_database(&mut conn).await?;
        let key = advisory::lock_key(&db_name);

        let deadline = Instant::now() + timeout;
        let poll = Duration::from_millis(200);

        loop {
            if advisory::try_lock(&mut conn, key).await? {
                tracing::debug!(database = %db_name, key, "migration lock acquired");
                return Ok(Self {
                    conn: Some(conn),
                    key,
                });
            }

            if Instant::now() >= deadline {
                let _ = conn.close().await;
                return Err(LockError::MigrationLockUnavailable {
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }

            tracing::debug!(database = %db_name, "migration lock busy, waiting");
            sleep(poll).await;
        }
    }

    pub fn key(&self) -> i64 {
        self.key
    }

    pub async fn release(mut self) -> Result<(), LockError> {
        let Some(mut conn) = self.conn.take() else {
            return Err(LockError::LockReleaseFailed {
                message: "lock connection missing".to_string(),
            });
        };

        let unlock_res = advisory::unlock(&mut conn, self.key).await;
        let close_res = conn.close().await;
        let close_msg = match &close_res {
            Ok(()) => String::new(),
            Err(e) => format!("; close_error={e}"),
        };

        match unlock_res {
            Ok(true) => close_res.map_err(|e| LockError::LockReleaseFailed {
                message: format!("connection close failed: {e}"),
            }),
            Ok(false) => Err(LockError::LockReleaseFailed {
                message: format!("pg_advisory_unlock returned false{close_msg}"),
            }),
            Err(err) => Err(LockError::LockReleaseFailed {
                message: format!("{err}{close_msg}"),
            }),
        }
    }
}
