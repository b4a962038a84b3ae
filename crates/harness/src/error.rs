use std::path::PathBuf;

use strata_config::ConfigError;
use strata_executor::ExecutorError;
use strata_migration::MigrationDiscoveryError;
use strata_schema::{DumpMismatch, SchemaError};
use thiserror::Error;

/// The database built from the full script repository does not match the
/// committed golden dump.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DriftError {
    #[error("schema drift against {}: {mismatch}", .golden.display())]
    Mismatch {
        golden: PathBuf,
        mismatch: DumpMismatch,
    },

    #[error("golden dump {} does not exist; run with --update-golden to create it", .golden.display())]
    MissingGolden { golden: PathBuf },
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("harness {operation} failed (connection): {message}")]
    Connection {
        operation: &'static str,
        message: String,
    },

    #[error("failed to {operation} ephemeral database `{database}`: {message}")]
    Provision {
        operation: &'static str,
        database: String,
        message: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Discovery(#[from] MigrationDiscoveryError),

    #[error(transparent)]
    Migration(#[from] ExecutorError),

    #[error(transparent)]
    Dump(#[from] SchemaError),

    #[error(transparent)]
    Drift(#[from] DriftError),

    #[error("failed to read golden dump {}: {message}", .path.display())]
    GoldenUnreadable { path: PathBuf, message: String },
}

impl HarnessError {
    pub(crate) fn from_sqlx(operation: &'static str, err: &sqlx::Error) -> Self {
        HarnessError::Connection {
            operation,
            message: err.to_string(),
        }
    }

    pub(crate) fn provision(operation: &'static str, database: &str, err: &sqlx::Error) -> Self {
        if strata_ledger::is_connection_error(err) {
            return Self::from_sqlx(operation, err);
        }

        HarnessError::Provision {
            operation,
            database: database.to_string(),
            message: err.to_string(),
        }
    }

    pub fn is_connection(&self) -> bool {
        match self {
            HarnessError::Connection { .. } => true,
            HarnessError::Migration(e) => e.is_retriable(),
            HarnessError::Dump(e) => e.is_connection(),
            _ => false,
        }
    }

    pub fn drift(&self) -> Option<&DriftError> {
        match self {
            HarnessError::Drift(e) => Some(e),
            _ => None,
        }
    }
}
