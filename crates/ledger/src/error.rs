use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The database could not be reached or the session died.
    #[error("ledger {operation} failed (connection): {message}")]
    Connection {
        operation: &'static str,
        message: String,
    },

    #[error("ledger {operation} failed: {message}")]
    Query {
        operation: &'static str,
        message: String,
    },

    #[error("invalid ledger configuration: {message}")]
    InvalidConfig { message: String },
}

impl LedgerError {
    pub(crate) fn from_sqlx(operation: &'static str, err: &sqlx::Error) -> Self {
        let message = err.to_string();
        if crate::classify::is_connection_error(err) {
            LedgerError::Connection { operation, message }
        } else {
            LedgerError::Query { operation, message }
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, LedgerError::Connection { .. })
    }
}
