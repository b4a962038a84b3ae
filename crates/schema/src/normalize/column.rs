use crate::Column;

pub fn normalize_column(column: &Column) -> Column {
    let default = match column.identity {
        // The backing sequence is implied by the identity itself.
        Some(_) => None,
        None => super::normalize_default(&column.default),
    };

    Column {
        name: super::normalize_name(&column.name),
        data_type: super::normalize_data_type(&column.data_type),
        default,
        ..column.clone()
    }
}
