use thiserror::Error;
use strata_migration::GapError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transient; the caller may retry.
    Connection,
    /// Repository and ledger disagree about ordering.
    Gap,
    /// The ledger exists but could not be queried.
    Ledger,
    /// A script already applied somewhere was edited.
    History,
    /// A script failed and its transaction was rolled back.
    ScriptExecution,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("connection error during {operation}: {message}")]
    Connection { operation: String, message: String },

    #[error(transparent)]
    Gap(#[from] GapError),

    #[error("ledger could not be read during {operation}: {message}")]
    LedgerUnreadable { operation: String, message: String },

    #[error(
        "checksum mismatch for version {sequence}: script changed after it was applied (ledger={recorded}, repository={actual})"
    )]
    ChecksumMismatch {
        sequence: i64,
        recorded: String,
        actual: String,
    },

    #[error("migration {sequence} ('{name}') failed{}: {message}", ordinal_suffix(.statement_ordinal))]
    ScriptExecution {
        sequence: i64,
        name: String,
        statement_ordinal: Option<i32>,
        statement: Option<String>,
        message: String,
    },
}

fn ordinal_suffix(ordinal: &Option<i32>) -> String {
    match ordinal {
        Some(o) => format!(" at statement {o}"),
        None => String::new(),
    }
}

impl ExecutorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutorError::Connection { .. } => ErrorKind::Connection,
            ExecutorError::Gap(_) => ErrorKind::Gap,
            ExecutorError::LedgerUnreadable { .. } => ErrorKind::Ledger,
            ExecutorError::ChecksumMismatch { .. } => ErrorKind::History,
            ExecutorError::ScriptExecution { .. } => ErrorKind::ScriptExecution,
        }
    }

    pub fn is_retriable(&self) -> bool {
        self.kind() == ErrorKind::Connection
    }

    pub fn sequence(&self) -> Option<i64> {
        match self {
            ExecutorError::ChecksumMismatch { sequence, .. }
            | ExecutorError::ScriptExecution { sequence, .. } => Some(*sequence),
            ExecutorError::Gap(GapError::NonContiguous { found, .. })
            | ExecutorError::Gap(GapError::LedgerHole { found, .. }) => Some(*found),
            _ => None,
        }
    }
}
