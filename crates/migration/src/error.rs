use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MigrationDiscoveryError {
    #[error("migrations directory is empty: {dir}")]
    EmptyMigrationsDir { dir: String },

    #[error("invalid migration filename '{filename}': {reason}")]
    InvalidFilename { filename: String, reason: String },

    #[error("duplicate migration sequence {sequence}: '{first}' and '{second}'")]
    DuplicateSequence {
        sequence: i64,
        first: String,
        second: String,
    },

    #[error("I/O error while reading '{path}': {message}")]
    Io { path: String, message: String },
}

/// The repository and the ledger disagree about ordering. Never resolved
/// automatically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GapError {
    #[error("migration sequence must be a positive integer, got {sequence} ('{name}')")]
    InvalidSequence { sequence: i64, name: String },

    #[error("duplicate migration sequence {sequence}: '{first}' and '{second}'")]
    DuplicateSequence {
        sequence: i64,
        first: String,
        second: String,
    },

    #[error(
        "migration sequence gap after version {current_version}: expected {expected}, found {found} ('{name}')"
    )]
    NonContiguous {
        current_version: i64,
        expected: i64,
        found: i64,
        name: String,
    },

    #[error("ledger is at version {current_version} but the repository has no script with that sequence")]
    UnknownLedgerVersion { current_version: i64 },

    #[error("ledger records version {sequence} ('{name}') but no corresponding migration script exists")]
    MissingScript { sequence: i64, name: String },

    #[error("ledger has a hole: version {expected} was never recorded but version {found} was")]
    LedgerHole { expected: i64, found: i64 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MigrationDriftError {
    #[error(
        "migration drift detected: version {sequence} ('{name}') exists in the ledger but no corresponding migration script was found"
    )]
    MissingScript { sequence: i64, name: String },

    #[error(
        "migration drift detected: checksum mismatch for version {sequence} (ledger={recorded}, repository={actual})"
    )]
    ChecksumMismatch {
        sequence: i64,
        recorded: String,
        actual: String,
    },
}
