pub mod error;
pub mod model;
pub mod parser;
pub mod pg_query;

pub use error::{sql_snippet, SqlStatementParseError};
pub use model::SqlStatement;
pub use parser::StatementParser;
pub use pg_query::{write_targets, PgQueryStatementParser};
