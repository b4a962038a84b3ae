use crate::error::ExecutorError;
use core::time::Duration;
use strata_migration::MigrationScript;
use strata_sql::{write_targets, PgQueryStatementParser, SqlStatement, StatementParser};

pub use strata_sql::sql_snippet;

/// Splits a script into statements and rejects the ones the runner must own:
/// transaction control and writes to the ledger table.
pub fn prepare_statements(
    script: &MigrationScript,
    ledger_table: &str,
) -> Result<Vec<SqlStatement>, ExecutorError> {
    let parser = PgQueryStatementParser::new();
    let statements = parser
        .parse_file(&script.sql, &script.filename)
        .map_err(|e| ExecutorError::ScriptExecution {
            sequence: script.sequence,
            name: script.name.clone(),
            statement_ordinal: None,
            statement: None,
            message: e.to_string(),
        })?;

    for stmt in &statements {
        let kind = statement_kind(&stmt.sql);
        let rejection = if is_forbidden_transaction_control(&kind) {
            Some("transaction control statements are not allowed inside migration files")
        } else if writes_ledger(&stmt.sql, ledger_table) {
            Some("migration files must not write to the ledger table; the runner records each script")
        } else {
            None
        };

        if let Some(message) = rejection {
            return Err(ExecutorError::ScriptExecution {
                sequence: script.sequence,
                name: script.name.clone(),
                statement_ordinal: Some(stmt.ordinal),
                statement: Some(sql_snippet(&stmt.sql)),
                message: message.to_string(),
            });
        }
    }

    Ok(statements)
}

/// First keyword of a statement, upper-cased, skipping leading comments.
pub fn statement_kind(sql: &str) -> String {
    let token = strip_leading_comments(sql)
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(|c: char| !c.is_ascii_alphabetic());

    if token.is_empty() {
        return "UNKNOWN".to_string();
    }

    token.to_ascii_uppercase()
}

fn strip_leading_comments(sql: &str) -> &str {
    let mut rest = sql.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.split_once('\n').map(|(_, tail)| tail).unwrap_or("").trim_start();
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map(|(_, tail)| tail).unwrap_or("").trim_start();
        } else {
            return rest;
        }
    }
}

fn is_forbidden_transaction_control(kind: &str) -> bool {
    matches!(
        kind,
        "BEGIN" | "COMMIT" | "ROLLBACK" | "START" | "END" | "ABORT" | "SAVEPOINT" | "RELEASE"
    )
}

/// Only the relation a statement writes counts; reading the ledger is fine.
fn writes_ledger(sql: &str, ledger_table: &str) -> bool {
    match write_targets(sql) {
        Ok(targets) => targets.iter().any(|t| t == ledger_table),
        // The whole script already parsed, so this statement does too.
        Err(_) => false,
    }
}

pub fn duration_ms(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}
