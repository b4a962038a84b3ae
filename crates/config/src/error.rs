use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("database url is required")]
    MissingDatabaseUrl,

    #[error("invalid database url: {message}")]
    InvalidDatabaseUrl { message: String },

    #[error("invalid {what} identifier '{value}': {reason}")]
    InvalidIdentifier {
        what: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("{what} must be greater than zero")]
    ZeroDuration { what: &'static str },
}
