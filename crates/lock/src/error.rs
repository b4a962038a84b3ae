use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LockError {
    #[error("migration lock unavailable (timeout_ms={timeout_ms})")]
    MigrationLockUnavailable { timeout_ms: u64 },

    #[error("lock acquire failed: {message}")]
    LockAcquireFailed { message: String },

    #[error("lock release failed: {message}")]
    LockReleaseFailed { message: String },
}
