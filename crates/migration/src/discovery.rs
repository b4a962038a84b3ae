use crate::checksum::sha256_hex;
use crate::error::MigrationDiscoveryError;
use crate::model::MigrationScript;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads the script repository from `dir`.
///
/// Every regular file must be named `<sequence>_<name>.sql`; dotfiles such as
/// `.gitkeep` are ignored. The result is sorted by sequence.
pub fn discover_migrations(
    dir: impl AsRef<Path>,
) -> Result<Vec<MigrationScript>, MigrationDiscoveryError> {
    let dir = dir.as_ref();
    let dir_display = dir.display().to_string();

    let entries = fs::read_dir(dir).map_err(|e| MigrationDiscoveryError::Io {
        path: dir_display.clone(),
        message: e.to_string(),
    })?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| MigrationDiscoveryError::Io {
            path: dir_display.clone(),
            message: e.to_string(),
        })?;

        let path = entry.path();
        let hidden = path
            .file_name()
            .map(|n| n.to_string_lossy().starts_with('.'))
            .unwrap_or(false);

        if path.is_file() && !hidden {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(MigrationDiscoveryError::EmptyMigrationsDir { dir: dir_display });
    }

    let mut candidates: Vec<(i64, String, String, PathBuf)> = Vec::with_capacity(files.len());
    for path in files {
        let filename = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| MigrationDiscoveryError::Io {
                path: path.display().to_string(),
                message: "missing filename".to_string(),
            })?;

        let (sequence, name) = parse_filename(&filename)?;
        candidates.push((sequence, name, filename, path));
    }

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.2.cmp(&b.2)));

    let mut seen: HashMap<i64, String> = HashMap::new();
    let mut out = Vec::with_capacity(candidates.len());

    for (sequence, name, filename, path) in candidates {
        if let Some(first) = seen.insert(sequence, filename.clone()) {
            return Err(MigrationDiscoveryError::DuplicateSequence {
                sequence,
                first,
                second: filename,
            });
        }

        let bytes = fs::read(&path).map_err(|e| MigrationDiscoveryError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let checksum = sha256_hex(&bytes);
        let sql = String::from_utf8(bytes).map_err(|e| MigrationDiscoveryError::Io {
            path: path.display().to_string(),
            message: format!("file is not valid UTF-8: {e}"),
        })?;

        tracing::debug!(sequence, %filename, "discovered migration script");
        out.push(MigrationScript::from_parts(sequence, name, filename, checksum, sql));
    }

    Ok(out)
}

fn parse_filename(filename: &str) -> Result<(i64, String), MigrationDiscoveryError> {
    let invalid = |reason: &str| MigrationDiscoveryError::InvalidFilename {
        filename: filename.to_string(),
        reason: reason.to_string(),
    };

    let base = filename
        .strip_suffix(".sql")
        .ok_or_else(|| invalid("file extension must be .sql"))?;

    let (sequence_str, name) = base
        .split_once('_')
        .ok_or_else(|| invalid("expected format <sequence>_<name>.sql"))?;

    if name.is_empty() {
        return Err(invalid("name segment must not be empty"));
    }

    if sequence_str.is_empty() || !sequence_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("sequence must be a positive integer"));
    }

    let sequence: i64 = sequence_str
        .parse()
        .map_err(|_| invalid("sequence is not a valid i64"))?;

    if sequence <= 0 {
        return Err(invalid("sequence must be a positive integer"));
    }

    Ok((sequence, name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{discover_migrations, parse_filename};
    use crate::error::MigrationDiscoveryError;
    use std::fs;

    #[test]
    fn empty_dir_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = discover_migrations(tmp.path()).unwrap_err();
        assert!(matches!(err, MigrationDiscoveryError::EmptyMigrationsDir { .. }));
    }

    #[test]
    fn invalid_filename_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("init.sql"), b"select 1;").unwrap();
        let err = discover_migrations(tmp.path()).unwrap_err();
        assert!(matches!(err, MigrationDiscoveryError::InvalidFilename { .. }));
    }

    #[test]
    fn zero_padded_names_parse_to_integers() {
        let (seq, name) = parse_filename("00024_alter_claction_table_add_forgiven.sql").unwrap();
        assert_eq!(seq, 24);
        assert_eq!(name, "alter_claction_table_add_forgiven");

        assert!(parse_filename("00000_zero.sql").is_err());
        assert!(parse_filename("_x.sql").is_err());
        assert!(parse_filename("0001_.sql").is_err());
        assert!(parse_filename("0001_x.txt").is_err());
    }

    #[test]
    fn sorts_numerically_and_rejects_duplicates() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("2_b.sql"), b"select 2;").unwrap();
        fs::write(tmp.path().join("10_c.sql"), b"select 10;").unwrap();
        fs::write(tmp.path().join("00001_a.sql"), b"select 1;").unwrap();
        fs::write(tmp.path().join(".gitkeep"), b"").unwrap();

        let scripts = discover_migrations(tmp.path()).unwrap();
        let sequences: Vec<i64> = scripts.iter().map(|m| m.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 10]);
        assert_eq!(scripts[0].filename, "00001_a.sql");
        assert_eq!(scripts[0].sql, "select 1;");

        fs::write(tmp.path().join("0002_dup.sql"), b"select 2;").unwrap();
        let err = discover_migrations(tmp.path()).unwrap_err();
        assert!(matches!(err, MigrationDiscoveryError::DuplicateSequence { sequence: 2, .. }));
    }

    #[test]
    fn non_utf8_body_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("1_bad.sql"), [0xff_u8, 0xfe, 0x00]).unwrap();
        let err = discover_migrations(tmp.path()).unwrap_err();
        assert!(matches!(err, MigrationDiscoveryError::Io { .. }));
    }
}
