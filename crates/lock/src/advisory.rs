use crate::error::LockError;
use sqlx::PgConnection;

/// Mixed into every key so strata's lock does not collide with advisory locks
/// taken by the application that owns the database ("STRATALK").
pub const STRATA_LOCK_KEY_NAMESPACE: u64 = 0x5354_5241_5441_4c4b;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Advisory lock key for one database. Two runners pointed at the same
/// database always contend for the same key.
pub fn lock_key(database_name: &str) -> i64 {
    let hash = database_name
        .bytes()
        .fold(FNV_OFFSET, |h, b| (h ^ u64::from(b)).wrapping_mul(FNV_PRIME));

    i64::from_be_bytes((hash ^ STRATA_LOCK_KEY_NAMESPACE).to_be_bytes())
}

pub async fn current_database(conn: &mut PgConnection) -> Result<String, LockError> {
    let (name,): (String,) = sqlx::query_as("SELECT current_database()::text")
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| acquire_failed("current_database", &e))?;

    Ok(name)
}

/// Non-blocking; the caller polls.
pub async fn try_lock(conn: &mut PgConnection, key: i64) -> Result<bool, LockError> {
    let (acquired,): (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
        .bind(key)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| acquire_failed("pg_try_advisory_lock", &e))?;

    Ok(acquired)
}

/// `false` means this session did not hold the lock.
pub async fn unlock(conn: &mut PgConnection, key: i64) -> Result<bool, LockError> {
    let (released,): (bool,) = sqlx::query_as("SELECT pg_advisory_unlock($1)")
        .bind(key)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| LockError::LockReleaseFailed {
            message: format!("pg_advisory_unlock failed: {e}"),
        })?;

    Ok(released)
}

fn acquire_failed(query: &str, err: &sqlx::Error) -> LockError {
    LockError::LockAcquireFailed {
        message: format!("{query} failed: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::lock_key;

    #[test]
    fn key_is_stable_per_database() {
        assert_eq!(lock_key("cidb"), lock_key("cidb"));
        assert_ne!(lock_key("cidb"), lock_key("cidb_test"));
    }

    #[test]
    fn empty_name_still_gets_the_namespace() {
        assert_ne!(lock_key(""), 0);
    }

    #[test]
    fn key_does_not_depend_on_host_byte_order() {
        assert_eq!(lock_key(""), -7447037722249433234);
        assert_eq!(lock_key("cidb"), -6127254150303923956);
    }
}
