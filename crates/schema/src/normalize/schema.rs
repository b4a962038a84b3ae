use crate::{EnumType, Schema};

use super::table::normalize_table;

/// Normalizes every object and re-keys the maps by normalized name, so
/// iteration order is the dump order.
pub fn normalize_schema(schema: &Schema) -> Schema {
    let mut out = Schema::new(super::normalize_name(&schema.name));

    for table in schema.tables.values() {
        let table = normalize_table(table);
        out.tables.insert(table.name.clone(), table);
    }

    // Label order is declaration order and must survive as is.
    for enum_type in schema.enum_types.values() {
        let name = super::normalize_name(&enum_type.name);
        out.enum_types.insert(
            name.clone(),
            EnumType {
                name,
                values: enum_type.values.clone(),
            },
        );
    }

    out
}
