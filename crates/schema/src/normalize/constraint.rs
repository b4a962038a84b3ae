use crate::{Constraint, ConstraintKind};

/// Suffixes PostgreSQL appends when it names a constraint itself
/// (`<table>_<columns>_<suffix>`).
const GENERATED_SUFFIXES: [&str; 5] = ["_pkey", "_key", "_fkey", "_check", "_excl"];

pub(crate) fn normalize_constraint(table_name: &str, constraint: &Constraint) -> Constraint {
    let kind = normalize_kind(&constraint.kind);
    let name = super::normalize_name(&constraint.name);

    let name = if is_generated_name(table_name, &name) {
        canonical_name(&kind)
    } else {
        name
    };

    Constraint { name, kind }
}

fn names(columns: &[String]) -> Vec<String> {
    columns.iter().map(|c| super::normalize_name(c)).collect()
}

fn normalize_kind(kind: &ConstraintKind) -> ConstraintKind {
    match kind {
        ConstraintKind::PrimaryKey { columns } => ConstraintKind::PrimaryKey {
            columns: names(columns),
        },
        ConstraintKind::Unique { columns } => ConstraintKind::Unique {
            columns: names(columns),
        },
        ConstraintKind::ForeignKey {
            columns,
            referenced_table,
            referenced_columns,
            on_delete,
            on_update,
        } => ConstraintKind::ForeignKey {
            columns: names(columns),
            referenced_table: super::normalize_name(referenced_table),
            referenced_columns: names(referenced_columns),
            on_delete: *on_delete,
            on_update: *on_update,
        },
        ConstraintKind::Check { expression } => ConstraintKind::Check {
            expression: super::normalize_whitespace(expression),
        },
        ConstraintKind::Other { definition } => ConstraintKind::Other {
            definition: super::normalize_whitespace(definition),
        },
    }
}

fn is_generated_name(table_name: &str, name: &str) -> bool {
    let Some(rest) = name.strip_prefix(table_name) else {
        return false;
    };

    rest.starts_with('_') && GENERATED_SUFFIXES.iter().any(|s| rest.ends_with(s))
}

/// Stable name derived from what the constraint does, used in place of a
/// server-generated one.
fn canonical_name(kind: &ConstraintKind) -> String {
    match kind {
        ConstraintKind::PrimaryKey { .. } => "primary_key".to_string(),
        ConstraintKind::Unique { columns } => format!("unique({})", columns.join(",")),
        ConstraintKind::ForeignKey {
            columns,
            referenced_table,
            referenced_columns,
            ..
        } => format!(
            "foreign_key({}->{referenced_table}({}))",
            columns.join(","),
            referenced_columns.join(",")
        ),
        ConstraintKind::Check { expression } => format!("check({expression})"),
        ConstraintKind::Other { definition } => format!("constraint({definition})"),
    }
}
