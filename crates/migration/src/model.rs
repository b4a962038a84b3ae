use crate::checksum::sha256_hex;

/// One immutable, sequentially numbered unit of schema change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    pub sequence: i64,
    pub name: String,
    pub filename: String,
    pub checksum: String,
    pub sql: String,
}

impl MigrationScript {
    /// Builds a script that did not come from disk. The filename follows the
    /// repository convention so messages look the same either way.
    pub fn new(sequence: i64, name: impl Into<String>, sql: impl Into<String>) -> Self {
        let name = name.into();
        let sql = sql.into();
        Self {
            sequence,
            filename: format!("{sequence:05}_{name}.sql"),
            checksum: sha256_hex(sql.as_bytes()),
            name,
            sql,
        }
    }

    pub fn from_parts(
        sequence: i64,
        name: String,
        filename: String,
        checksum: String,
        sql: String,
    ) -> Self {
        Self {
            sequence,
            name,
            filename,
            checksum,
            sql,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MigrationScript;

    #[test]
    fn new_synthesizes_padded_filename_and_checksum() {
        let s = MigrationScript::new(24, "alter_claction_table_add_forgiven", "select 1;");
        assert_eq!(s.filename, "00024_alter_claction_table_add_forgiven.sql");
        assert_eq!(s.checksum.len(), 64);
    }
}
