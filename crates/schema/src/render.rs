use std::fmt::Write as _;

use crate::{Column, Constraint, ConstraintKind, EnumType, Identity, Index, Schema, Table};

/// Renders a normalized schema as canonical dump text.
///
/// Objects appear in lexical order (enum types, then tables), one object per
/// block, separated by a blank line. The text always ends with a newline and
/// contains no comments, so equal structures give byte-identical dumps.
pub fn render(schema: &Schema) -> String {
    let blocks: Vec<String> = schema
        .enum_types
        .values()
        .map(render_enum)
        .chain(schema.tables.values().map(render_table))
        .collect();

    let mut out = blocks.join("\n");
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn render_enum(enum_type: &EnumType) -> String {
    let labels = enum_type
        .values
        .iter()
        .map(|v| quote_literal(v))
        .collect::<Vec<_>>()
        .join(", ");

    format!("enum {} ({labels})\n", enum_type.name)
}

fn render_table(table: &Table) -> String {
    let mut out = format!("table {}\n", table.name);

    for column in table.columns.values() {
        let _ = writeln!(out, "  {}", render_column(column));
    }
    for constraint in table.constraints.values() {
        let _ = writeln!(out, "  {}", render_constraint(constraint));
    }
    for index in table.indexes.values() {
        let _ = writeln!(out, "  {}", render_index(index));
    }

    out
}

fn render_column(column: &Column) -> String {
    let mut line = format!("column {} {}", column.name, column.data_type);

    if !column.nullable {
        line.push_str(" not null");
    }
    if let Some(default) = &column.default {
        let _ = write!(line, " default {default}");
    }
    match column.identity {
        Some(Identity::Always) => line.push_str(" generated always as identity"),
        Some(Identity::ByDefault) => line.push_str(" generated by default as identity"),
        None => {}
    }

    line
}

fn render_constraint(constraint: &Constraint) -> String {
    let body = match &constraint.kind {
        ConstraintKind::PrimaryKey { columns } => format!("primary key ({})", columns.join(", ")),
        ConstraintKind::Unique { columns } => format!("unique ({})", columns.join(", ")),
        ConstraintKind::ForeignKey {
            columns,
            referenced_table,
            referenced_columns,
            on_delete,
            on_update,
        } => format!(
            "foreign key ({}) references {referenced_table} ({}) on delete {} on update {}",
            columns.join(", "),
            referenced_columns.join(", "),
            on_delete.as_sql(),
            on_update.as_sql(),
        ),
        ConstraintKind::Check { expression } => expression.clone(),
        ConstraintKind::Other { definition } => definition.clone(),
    };

    format!("constraint {} {body}", constraint.name)
}

fn render_index(index: &Index) -> String {
    let mut line = format!("index {}", index.name);

    if index.unique {
        line.push_str(" unique");
    }
    let _ = write!(line, " using {} ({})", index.method, index.columns.join(", "));
    if let Some(predicate) = &index.predicate {
        let _ = write!(line, " where {predicate}");
    }

    line
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{normalize_schema, ReferentialAction};

    fn sample_schema() -> Schema {
        let mut customers = Table::new("customers");
        customers.columns.insert(
            "id".to_string(),
            Column {
                name: "id".to_string(),
                data_type: "bigint".to_string(),
                nullable: false,
                default: None,
                identity: Some(Identity::Always),
            },
        );
        customers.constraints.insert(
            "customers_pkey".to_string(),
            Constraint {
                name: "customers_pkey".to_string(),
                kind: ConstraintKind::PrimaryKey {
                    columns: vec!["id".to_string()],
                },
            },
        );

        let mut orders = Table::new("orders");
        orders.columns.insert(
            "status".to_string(),
            Column {
                name: "status".to_string(),
                data_type: "varchar".to_string(),
                nullable: true,
                default: Some("'new'::character varying".to_string()),
                identity: None,
            },
        );
        orders.columns.insert(
            "customer_id".to_string(),
            Column {
                name: "customer_id".to_string(),
                data_type: "int8".to_string(),
                nullable: false,
                default: None,
                identity: None,
            },
        );
        orders.constraints.insert(
            "orders_customer_id_fkey".to_string(),
            Constraint {
                name: "orders_customer_id_fkey".to_string(),
                kind: ConstraintKind::ForeignKey {
                    columns: vec!["customer_id".to_string()],
                    referenced_table: "customers".to_string(),
                    referenced_columns: vec!["id".to_string()],
                    on_delete: ReferentialAction::Cascade,
                    on_update: ReferentialAction::NoAction,
                },
            },
        );
        orders.indexes.insert(
            "orders_open".to_string(),
            Index {
                name: "orders_open".to_string(),
                columns: vec!["customer_id".to_string()],
                unique: false,
                method: "btree".to_string(),
                predicate: Some("status = 'new'".to_string()),
            },
        );

        let mut schema = Schema::new("public");
        // Inserted out of order on purpose.
        schema.tables.insert("orders".to_string(), orders);
        schema.tables.insert("customers".to_string(), customers);
        schema.enum_types.insert(
            "mood".to_string(),
            EnumType {
                name: "mood".to_string(),
                values: vec!["sad".to_string(), "it's ok".to_string()],
            },
        );
        schema
    }

    #[test]
    fn renders_canonical_text() {
        let text = render(&normalize_schema(&sample_schema()));

        let expected = "\
enum mood ('sad', 'it''s ok')

table customers
  column id bigint not null generated always as identity
  constraint primary_key primary key (id)

table orders
  column customer_id bigint not null
  column status character varying default 'new'
  constraint foreign_key(customer_id->customers(id)) foreign key (customer_id) references customers (id) on delete cascade on update no action
  index orders_open using btree (customer_id) where status = 'new'
";
        assert_eq!(text, expected);
    }

    #[test]
    fn rendering_is_deterministic() {
        let schema = normalize_schema(&sample_schema());
        assert_eq!(render(&schema), render(&schema.clone()));
        assert_eq!(render(&schema), render(&normalize_schema(&schema)));
    }

    #[test]
    fn empty_schema_renders_a_single_newline() {
        assert_eq!(render(&Schema::new("public")), "\n");
    }
}
