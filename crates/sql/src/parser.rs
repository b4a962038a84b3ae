use crate::error::SqlStatementParseError;
use crate::model::SqlStatement;

/// Splits a script body into the statements it contains, in source order.
///
/// Implementations number statements from 1 and drop empty ones, so the
/// ordinal in an error message matches what a reader counts in the file.
pub trait StatementParser {
    fn parse_statements(
        &self,
        sql: &str,
        source_name: Option<&str>,
    ) -> Result<Vec<SqlStatement>, SqlStatementParseError>;

    /// Same as [`parse_statements`](Self::parse_statements) for a script that
    /// came from a named file.
    fn parse_file(
        &self,
        sql: &str,
        filename: &str,
    ) -> Result<Vec<SqlStatement>, SqlStatementParseError> {
        self.parse_statements(sql, Some(filename))
    }
}
