use crate::error::{sql_snippet, SqlStatementParseError};
use crate::model::SqlStatement;
use crate::parser::StatementParser;
use pg_query::protobuf::RangeVar;
use pg_query::NodeEnum;

/// Splits a script with the real PostgreSQL grammar, so dollar-quoted bodies
/// and `DO` blocks stay whole.
pub struct PgQueryStatementParser;

impl PgQueryStatementParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PgQueryStatementParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser for PgQueryStatementParser {
    fn parse_statements(
        &self,
        sql: &str,
        source_name: Option<&str>,
    ) -> Result<Vec<SqlStatement>, SqlStatementParseError> {
        let owned_source = || source_name.map(|s| s.to_string());

        let parsed = pg_query::parse(sql).map_err(|e| SqlStatementParseError::SqlParseFailed {
            source_name: owned_source(),
            message: e.to_string(),
            sql_snippet: sql_snippet(sql),
        })?;

        let stmts = &parsed.protobuf.stmts;
        if stmts.is_empty() {
            return Err(SqlStatementParseError::EmptyScript {
                source_name: owned_source(),
            });
        }

        let sql_len = sql.len();
        let mut out = Vec::with_capacity(stmts.len());

        for (idx, raw) in stmts.iter().enumerate() {
            let stmt_location = raw.stmt_location;
            let stmt_len = raw.stmt_len;
            let bad_location = || SqlStatementParseError::InvalidStatementLocation {
                source_name: owned_source(),
                statement_index: idx,
                stmt_location,
                stmt_len,
                sql_len,
            };

            let start = usize::try_from(stmt_location).map_err(|_| bad_location())?;
            if start > sql_len {
                return Err(bad_location());
            }

            // A zero length means "until the next statement or end of input".
            let end = if stmt_len > 0 {
                let len = usize::try_from(stmt_len).map_err(|_| bad_location())?;
                start.saturating_add(len)
            } else {
                stmts
                    .get(idx + 1)
                    .and_then(|next| usize::try_from(next.stmt_location).ok())
                    .unwrap_or(sql_len)
                    .min(sql_len)
            };

            if end < start || end > sql_len {
                return Err(bad_location());
            }

            let extracted = sql.get(start..end).ok_or_else(|| {
                SqlStatementParseError::StatementExtractionFailed {
                    source_name: owned_source(),
                    statement_index: idx,
                    message: format!("invalid utf-8 slice boundaries (start={start}, end={end})"),
                }
            })?;

            let extracted = extracted.trim().trim_end_matches(';').trim_end();
            if extracted.is_empty() {
                continue;
            }

            let ordinal = i32::try_from(out.len() + 1).unwrap_or(i32::MAX);
            out.push(SqlStatement {
                ordinal,
                sql: extracted.to_string(),
            });
        }

        if out.is_empty() {
            return Err(SqlStatementParseError::EmptyScript {
                source_name: owned_source(),
            });
        }

        Ok(out)
    }
}

/// Relations a single statement writes to directly: the target of
/// `INSERT`, `UPDATE`, `DELETE`, `MERGE`, and every table named by `TRUNCATE`.
/// Tables that are only read (an `INSERT ... SELECT` source) are not listed.
pub fn write_targets(sql: &str) -> Result<Vec<String>, SqlStatementParseError> {
    let parsed = pg_query::parse(sql).map_err(|e| SqlStatementParseError::SqlParseFailed {
        source_name: None,
        message: e.to_string(),
        sql_snippet: sql_snippet(sql),
    })?;

    let mut targets = Vec::new();
    for raw in &parsed.protobuf.stmts {
        let Some(node) = raw.stmt.as_ref().and_then(|n| n.node.as_ref()) else {
            continue;
        };

        let relation: Option<&RangeVar> = match node {
            NodeEnum::InsertStmt(s) => s.relation.as_ref(),
            NodeEnum::UpdateStmt(s) => s.relation.as_ref(),
            NodeEnum::DeleteStmt(s) => s.relation.as_ref(),
            NodeEnum::MergeStmt(s) => s.relation.as_ref(),
            NodeEnum::TruncateStmt(s) => {
                targets.extend(s.relations.iter().filter_map(|n| match n.node.as_ref() {
                    Some(NodeEnum::RangeVar(rv)) => Some(rv.relname.clone()),
                    _ => None,
                }));
                None
            }
            _ => None,
        };

        if let Some(rv) = relation {
            targets.push(rv.relname.clone());
        }
    }

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::write_targets;

    #[test]
    fn write_targets_name_only_the_written_relation() {
        assert_eq!(
            write_targets("INSERT INTO archive SELECT * FROM schema_version").unwrap(),
            vec!["archive"]
        );
        assert_eq!(
            write_targets("UPDATE public.schema_version SET name = 'x' WHERE sequence = 1").unwrap(),
            vec!["schema_version"]
        );
        assert_eq!(
            write_targets("TRUNCATE build, claction").unwrap(),
            vec!["build", "claction"]
        );
        assert!(write_targets("SELECT * FROM schema_version").unwrap().is_empty());
    }
}
