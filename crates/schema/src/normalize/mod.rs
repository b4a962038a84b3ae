//! Canonical form of an introspected [`Schema`](crate::Schema).
//!
//! Two databases built by the same scripts must normalize to equal values even
//! when the server spells things differently (type aliases, cast suffixes on
//! defaults, generated constraint names).

mod column;
mod constraint;
mod index;
mod schema;
mod table;

pub use column::normalize_column;
pub use schema::normalize_schema;
pub use table::normalize_table;

/// Catalog names are canonical already; quoted identifiers keep their case.
fn normalize_name(name: &str) -> String {
    name.trim().to_string()
}

fn normalize_whitespace(input: &str) -> String {
    let input = input.trim();

    let mut out = String::with_capacity(input.len());
    let mut prev_was_space = false;

    for ch in input.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                out.push(' ');
                prev_was_space = true;
            }
        } else {
            out.push(ch);
            prev_was_space = false;
        }
    }

    out
}

fn normalize_data_type(data_type: &str) -> String {
    let data_type = normalize_whitespace(data_type);

    let canonical = match data_type.to_lowercase().as_str() {
        "int" | "int4" => "integer",
        "int2" => "smallint",
        "int8" => "bigint",
        "float4" => "real",
        "float8" => "double precision",
        "varchar" => "character varying",
        "char" | "bpchar" => "character",
        "bool" => "boolean",
        "decimal" => "numeric",
        "timestamp" => "timestamp without time zone",
        "timestamptz" => "timestamp with time zone",
        "time" => "time without time zone",
        "timetz" => "time with time zone",
        _ => return normalize_parameterized(data_type),
    };

    canonical.to_string()
}

/// `varchar(20)` and friends keep their modifier behind the long name. Anything
/// else, user-defined types included, is kept as the catalog spells it.
fn normalize_parameterized(data_type: String) -> String {
    let Some((base, rest)) = data_type.split_once('(') else {
        return data_type;
    };

    let base = match base.trim().to_lowercase().as_str() {
        "varchar" => "character varying",
        "char" | "bpchar" => "character",
        "decimal" => "numeric",
        _ => return data_type,
    };

    format!("{base}({rest}")
}

fn normalize_default(default: &Option<String>) -> Option<String> {
    let default = default.as_ref()?;

    let trimmed = default.trim();
    if trimmed.is_empty() {
        return Some(String::new());
    }

    if trimmed.eq_ignore_ascii_case("null") {
        return None;
    }

    let trimmed_lower = trimmed.to_ascii_lowercase();
    for cast in ["::text", "::character varying"] {
        if trimmed_lower.ends_with(cast) {
            let prefix = trimmed[..trimmed.len() - cast.len()].trim();

            if prefix.starts_with('\'') && prefix.ends_with('\'') {
                return Some(prefix.to_string());
            }
        }
    }

    Some(trimmed.to_string())
}
