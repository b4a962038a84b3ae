use sqlx::{postgres::PgRow, PgConnection, Row};

use crate::{
    Column, Constraint, ConstraintKind, EnumType, Identity, Index, ReferentialAction, Schema,
    SchemaError, Table,
};

const SCHEMA_EXISTS_SQL: &str =
    "SELECT EXISTS (SELECT 1 FROM pg_catalog.pg_namespace WHERE nspname = $1)";

const TABLES_SQL: &str = r#"
SELECT c.relname::text AS table_name
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = $1
  AND c.relkind IN ('r', 'p')
  AND NOT c.relispartition
ORDER BY c.relname
"#;

const COLUMNS_SQL: &str = r#"
SELECT c.relname::text AS table_name,
       a.attname::text AS column_name,
       pg_catalog.format_type(a.atttypid, a.atttypmod) AS data_type,
       a.attnotnull AS not_null,
       pg_catalog.pg_get_expr(d.adbin, d.adrelid) AS default_expr,
       a.attidentity::text AS identity
FROM pg_catalog.pg_attribute a
JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
LEFT JOIN pg_catalog.pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
WHERE n.nspname = $1
  AND c.relkind IN ('r', 'p')
  AND NOT c.relispartition
  AND a.attnum > 0
  AND NOT a.attisdropped
ORDER BY c.relname, a.attnum
"#;

const CONSTRAINTS_SQL: &str = r#"
SELECT c.relname::text AS table_name,
       con.conname::text AS constraint_name,
       con.contype::text AS contype,
       ARRAY(
           SELECT a.attname::text
           FROM unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
           JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
           ORDER BY k.ord
       ) AS columns,
       fc.relname::text AS referenced_table,
       ARRAY(
           SELECT a.attname::text
           FROM unnest(con.confkey) WITH ORDINALITY AS k(attnum, ord)
           JOIN pg_catalog.pg_attribute a ON a.attrelid = con.confrelid AND a.attnum = k.attnum
           ORDER BY k.ord
       ) AS referenced_columns,
       con.confdeltype::text AS on_delete,
       con.confupdtype::text AS on_update,
       pg_catalog.pg_get_constraintdef(con.oid, true) AS definition
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
LEFT JOIN pg_catalog.pg_class fc ON fc.oid = con.confrelid
WHERE n.nspname = $1
  AND con.contype IN ('p', 'f', 'u', 'c', 'x')
ORDER BY c.relname, con.conname
"#;

// Indexes owned by a constraint are reported through the constraint.
const INDEXES_SQL: &str = r#"
SELECT t.relname::text AS table_name,
       i.relname::text AS index_name,
       ix.indisunique AS is_unique,
       am.amname::text AS method,
       ARRAY(
           SELECT pg_catalog.pg_get_indexdef(ix.indexrelid, k, true)
           FROM generate_series(1, ix.indnkeyatts::int) AS k
           ORDER BY k
       ) AS columns,
       pg_catalog.pg_get_expr(ix.indpred, ix.indrelid, true) AS predicate
FROM pg_catalog.pg_index ix
JOIN pg_catalog.pg_class i ON i.oid = ix.indexrelid
JOIN pg_catalog.pg_class t ON t.oid = ix.indrelid
JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
JOIN pg_catalog.pg_am am ON am.oid = i.relam
WHERE n.nspname = $1
  AND t.relkind IN ('r', 'p')
  AND NOT EXISTS (
      SELECT 1 FROM pg_catalog.pg_constraint con
      WHERE con.conindid = ix.indexrelid AND con.contype IN ('p', 'u', 'x')
  )
ORDER BY t.relname, i.relname
"#;

const ENUMS_SQL: &str = r#"
SELECT t.typname::text AS type_name,
       ARRAY(
           SELECT e.enumlabel::text
           FROM pg_catalog.pg_enum e
           WHERE e.enumtypid = t.oid
           ORDER BY e.enumsortorder
       ) AS labels
FROM pg_catalog.pg_type t
JOIN pg_catalog.pg_namespace n ON n.oid = t.typnamespace
WHERE n.nspname = $1
  AND t.typtype = 'e'
ORDER BY t.typname
"#;

/// Reads the structure of `schema_name` from the system catalogs.
///
/// Only catalog queries are issued; the caller decides the transaction they
/// run in. Row data is never read.
pub async fn introspect(conn: &mut PgConnection, schema_name: &str) -> Result<Schema, SchemaError> {
    let (exists,): (bool,) = sqlx::query_as(SCHEMA_EXISTS_SQL)
        .bind(schema_name)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| SchemaError::from_sqlx("schema lookup", &e))?;

    if !exists {
        return Err(SchemaError::UnknownSchema {
            schema: schema_name.to_string(),
        });
    }

    let mut schema = Schema::new(schema_name);

    for row in fetch(conn, "tables", TABLES_SQL, schema_name).await? {
        let name: String = get(&row, "tables", "table_name")?;
        schema.tables.insert(name.clone(), Table::new(name));
    }

    for row in fetch(conn, "columns", COLUMNS_SQL, schema_name).await? {
        let table: String = get(&row, "columns", "table_name")?;
        let identity: Option<String> = get(&row, "columns", "identity")?;
        let not_null: bool = get(&row, "columns", "not_null")?;

        let column = Column {
            name: get(&row, "columns", "column_name")?,
            data_type: get(&row, "columns", "data_type")?,
            nullable: !not_null,
            default: get(&row, "columns", "default_expr")?,
            identity: identity.as_deref().and_then(Identity::from_pg_code),
        };

        if let Some(t) = schema.tables.get_mut(&table) {
            t.columns.insert(column.name.clone(), column);
        }
    }

    for row in fetch(conn, "constraints", CONSTRAINTS_SQL, schema_name).await? {
        let table: String = get(&row, "constraints", "table_name")?;
        let constraint = constraint_from_row(&row)?;

        if let Some(t) = schema.tables.get_mut(&table) {
            t.constraints.insert(constraint.name.clone(), constraint);
        }
    }

    for row in fetch(conn, "indexes", INDEXES_SQL, schema_name).await? {
        let table: String = get(&row, "indexes", "table_name")?;
        let index = Index {
            name: get(&row, "indexes", "index_name")?,
            columns: get(&row, "indexes", "columns")?,
            unique: get(&row, "indexes", "is_unique")?,
            method: get(&row, "indexes", "method")?,
            predicate: get(&row, "indexes", "predicate")?,
        };

        if let Some(t) = schema.tables.get_mut(&table) {
            t.indexes.insert(index.name.clone(), index);
        }
    }

    for row in fetch(conn, "enums", ENUMS_SQL, schema_name).await? {
        let enum_type = EnumType {
            name: get(&row, "enums", "type_name")?,
            values: get(&row, "enums", "labels")?,
        };
        schema.enum_types.insert(enum_type.name.clone(), enum_type);
    }

    tracing::debug!(
        schema = schema_name,
        tables = schema.tables.len(),
        enums = schema.enum_types.len(),
        "introspected schema"
    );

    Ok(schema)
}

fn constraint_from_row(row: &PgRow) -> Result<Constraint, SchemaError> {
    const OP: &str = "constraints";

    let name: String = get(row, OP, "constraint_name")?;
    let contype: String = get(row, OP, "contype")?;
    let columns: Vec<String> = get(row, OP, "columns")?;
    let definition: String = get(row, OP, "definition")?;

    let kind = match contype.as_str() {
        "p" => ConstraintKind::PrimaryKey { columns },
        "u" => ConstraintKind::Unique { columns },
        "f" => {
            let referenced_table: Option<String> = get(row, OP, "referenced_table")?;
            let on_delete: String = get(row, OP, "on_delete")?;
            let on_update: String = get(row, OP, "on_update")?;

            ConstraintKind::ForeignKey {
                columns,
                referenced_table: referenced_table.unwrap_or_default(),
                referenced_columns: get(row, OP, "referenced_columns")?,
                on_delete: ReferentialAction::from_pg_code(&on_delete),
                on_update: ReferentialAction::from_pg_code(&on_update),
            }
        }
        "c" => ConstraintKind::Check {
            expression: definition,
        },
        _ => ConstraintKind::Other { definition },
    };

    Ok(Constraint { name, kind })
}

async fn fetch(
    conn: &mut PgConnection,
    operation: &'static str,
    sql: &'static str,
    schema_name: &str,
) -> Result<Vec<PgRow>, SchemaError> {
    sqlx::query(sql)
        .bind(schema_name)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| SchemaError::from_sqlx(operation, &e))
}

fn get<'r, T>(row: &'r PgRow, operation: &'static str, column: &str) -> Result<T, SchemaError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| SchemaError::from_sqlx(operation, &e))
}
