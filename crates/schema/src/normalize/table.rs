use std::collections::BTreeMap;

use crate::Table;

use super::{column::normalize_column, constraint::normalize_constraint, index::normalize_index};

pub fn normalize_table(table: &Table) -> Table {
    let name = super::normalize_name(&table.name);

    let columns = table
        .columns
        .values()
        .map(|c| {
            let c = normalize_column(c);
            (c.name.clone(), c)
        })
        .collect::<BTreeMap<_, _>>();

    let constraints = table
        .constraints
        .values()
        .map(|c| {
            let c = normalize_constraint(&name, c);
            (c.name.clone(), c)
        })
        .collect::<BTreeMap<_, _>>();

    let indexes = table
        .indexes
        .values()
        .map(|index| {
            let index = normalize_index(index);
            (index.name.clone(), index)
        })
        .collect::<BTreeMap<_, _>>();

    Table {
        name,
        columns,
        indexes,
        constraints,
    }
}
