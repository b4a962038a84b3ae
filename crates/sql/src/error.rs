use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqlStatementParseError {
    #[error("sql parse failed{}: {message}; sql={sql_snippet}", source_suffix(.source_name))]
    SqlParseFailed {
        source_name: Option<String>,
        message: String,
        sql_snippet: String,
    },

    #[error(
        "invalid statement location{} at index {statement_index} (location={stmt_location}, len={stmt_len}, sql_len={sql_len})",
        source_suffix(.source_name)
    )]
    InvalidStatementLocation {
        source_name: Option<String>,
        statement_index: usize,
        stmt_location: i32,
        stmt_len: i32,
        sql_len: usize,
    },

    #[error("script contains no statements{}", source_suffix(.source_name))]
    EmptyScript { source_name: Option<String> },

    #[error(
        "statement extraction failed{} at index {statement_index}: {message}",
        source_suffix(.source_name)
    )]
    StatementExtractionFailed {
        source_name: Option<String>,
        statement_index: usize,
        message: String,
    },
}

fn source_suffix(source_name: &Option<String>) -> String {
    match source_name {
        Some(name) => format!(" ({name})"),
        None => String::new(),
    }
}

/// Single-line, length-capped rendering of a statement for error messages.
pub fn sql_snippet(sql: &str) -> String {
    const MAX_CHARS: usize = 200;
    let trimmed = sql.trim();

    let mut out = String::with_capacity(trimmed.len().min(MAX_CHARS) + 1);
    for (i, ch) in trimmed.chars().enumerate() {
        if i >= MAX_CHARS {
            out.push('…');
            break;
        }

        match ch {
            '\n' | '\r' | '\t' => out.push(' '),
            _ => out.push(ch),
        }
    }

    out
}
