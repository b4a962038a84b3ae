pub mod advisory;
pub mod error;
pub mod guard;

pub use error::LockError;
pub use guard::AdvisoryLockGuard;
