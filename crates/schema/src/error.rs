use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("schema dump {operation} failed (connection): {message}")]
    Connection {
        operation: &'static str,
        message: String,
    },

    #[error("schema dump {operation} failed: {message}")]
    Query {
        operation: &'static str,
        message: String,
    },

    #[error("schema `{schema}` does not exist")]
    UnknownSchema { schema: String },

    #[error("failed to write dump to {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },
}

impl SchemaError {
    pub(crate) fn from_sqlx(operation: &'static str, err: &sqlx::Error) -> Self {
        let message = err.to_string();
        if strata_ledger::is_connection_error(err) {
            SchemaError::Connection { operation, message }
        } else {
            SchemaError::Query { operation, message }
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, SchemaError::Connection { .. })
    }
}
