use std::path::Path;

use sqlx::{Connection, PgConnection, PgPool};

use crate::{introspect, normalize_schema, render, SchemaError};

/// Canonical structural dump of `schema_name`, taken on a pooled connection.
pub async fn dump(pool: &PgPool, schema_name: &str) -> Result<String, SchemaError> {
    let mut conn = pool
        .acquire()
        .await
        .map_err(|e| SchemaError::from_sqlx("acquire", &e))?;

    dump_connection(&mut conn, schema_name).await
}

/// Dumps inside a read-only snapshot that is rolled back afterwards, so the
/// dump can never write to the database it describes.
pub async fn dump_connection(
    conn: &mut PgConnection,
    schema_name: &str,
) -> Result<String, SchemaError> {
    let mut tx = conn
        .begin()
        .await
        .map_err(|e| SchemaError::from_sqlx("begin", &e))?;

    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await
        .map_err(|e| SchemaError::from_sqlx("begin", &e))?;

    let introspected = introspect(&mut tx, schema_name).await;

    if let Err(err) = tx.rollback().await {
        tracing::warn!(error = %err, "failed to roll back dump snapshot");
    }

    let schema = introspected?;
    let text = render(&normalize_schema(&schema));

    tracing::info!(
        schema = schema_name,
        tables = schema.tables.len(),
        bytes = text.len(),
        "schema dumped"
    );

    Ok(text)
}

/// Writes dump text to `path`, replacing any previous artifact.
pub fn write_dump(path: &Path, text: &str) -> Result<(), SchemaError> {
    let write_err = |e: std::io::Error| SchemaError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    std::fs::write(path, text).map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_dump_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("schema").join("golden.sql");

        write_dump(&path, "table a\n").expect("write dump");

        assert_eq!(std::fs::read_to_string(&path).expect("read back"), "table a\n");
    }

    #[test]
    fn write_dump_replaces_previous_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("golden.sql");

        write_dump(&path, "table old\n").expect("first write");
        write_dump(&path, "table new\n").expect("second write");

        assert_eq!(std::fs::read_to_string(&path).expect("read back"), "table new\n");
    }
}
