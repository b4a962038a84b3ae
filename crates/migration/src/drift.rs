use crate::error::{GapError, MigrationDriftError};
use crate::model::MigrationScript;
use std::collections::HashMap;

/// What the ledger remembers about one applied script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub sequence: i64,
    pub name: String,
    /// `None` for rows written by a script run by hand.
    pub checksum: Option<String>,
}

pub fn detect_drift(
    repository: &[MigrationScript],
    applied: &[AppliedMigration],
) -> Result<(), MigrationDriftError> {
    let mut by_sequence: HashMap<i64, &MigrationScript> = HashMap::with_capacity(repository.len());
    for s in repository {
        by_sequence.insert(s.sequence, s);
    }

    for entry in applied {
        let Some(script) = by_sequence.get(&entry.sequence) else {
            return Err(MigrationDriftError::MissingScript {
                sequence: entry.sequence,
                name: entry.name.clone(),
            });
        };

        if let Some(recorded) = &entry.checksum {
            if *recorded != script.checksum {
                return Err(MigrationDriftError::ChecksumMismatch {
                    sequence: entry.sequence,
                    recorded: recorded.clone(),
                    actual: script.checksum.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Applied sequences must be exactly `1..=n`, whatever order the rows come in.
pub fn check_ledger_prefix(applied: &[AppliedMigration]) -> Result<(), GapError> {
    let mut sequences: Vec<i64> = applied.iter().map(|a| a.sequence).collect();
    sequences.sort_unstable();

    for (expected, found) in (1..).zip(sequences) {
        if found != expected {
            return Err(GapError::LedgerHole { expected, found });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check_ledger_prefix, detect_drift, AppliedMigration};
    use crate::error::{GapError, MigrationDriftError};
    use crate::model::MigrationScript;

    fn applied(script: &MigrationScript) -> AppliedMigration {
        AppliedMigration {
            sequence: script.sequence,
            name: script.name.clone(),
            checksum: Some(script.checksum.clone()),
        }
    }

    #[test]
    fn ok_when_ledger_is_prefix_and_new_scripts_exist() {
        let repo = vec![
            MigrationScript::new(1, "a", "select 1;"),
            MigrationScript::new(2, "b", "select 2;"),
            MigrationScript::new(3, "c", "select 3;"),
        ];
        let ledger = vec![applied(&repo[0]), applied(&repo[1])];
        assert!(detect_drift(&repo, &ledger).is_ok());
    }

    #[test]
    fn error_when_ledger_row_has_no_script() {
        let repo = vec![MigrationScript::new(2, "b", "select 2;")];
        let ledger = vec![AppliedMigration {
            sequence: 1,
            name: "a".to_string(),
            checksum: None,
        }];
        let err = detect_drift(&repo, &ledger).unwrap_err();
        assert!(matches!(err, MigrationDriftError::MissingScript { sequence: 1, .. }));
    }

    #[test]
    fn error_when_applied_script_was_edited() {
        let original = MigrationScript::new(1, "a", "create table t (id int);");
        let edited = MigrationScript::new(1, "a", "create table t (id bigint);");
        let err = detect_drift(&[edited], &[applied(&original)]).unwrap_err();
        assert!(matches!(err, MigrationDriftError::ChecksumMismatch { sequence: 1, .. }));
    }

    #[test]
    fn rows_without_checksum_are_not_compared() {
        let repo = vec![MigrationScript::new(1, "a", "select 1;")];
        let ledger = vec![AppliedMigration {
            sequence: 1,
            name: "a".to_string(),
            checksum: None,
        }];
        assert!(detect_drift(&repo, &ledger).is_ok());
    }

    fn row(sequence: i64) -> AppliedMigration {
        AppliedMigration {
            sequence,
            name: format!("step_{sequence}"),
            checksum: None,
        }
    }

    #[test]
    fn ledger_prefix_accepts_contiguous_rows_in_any_order() {
        assert!(check_ledger_prefix(&[]).is_ok());
        assert!(check_ledger_prefix(&[row(2), row(1), row(3)]).is_ok());
    }

    #[test]
    fn ledger_with_a_hole_is_a_gap() {
        let err = check_ledger_prefix(&[row(1), row(3)]).unwrap_err();
        assert_eq!(err, GapError::LedgerHole { expected: 2, found: 3 });

        let err = check_ledger_prefix(&[row(2)]).unwrap_err();
        assert_eq!(err, GapError::LedgerHole { expected: 1, found: 2 });
    }

    #[test]
    fn duplicate_ledger_rows_are_a_gap() {
        let err = check_ledger_prefix(&[row(1), row(1)]).unwrap_err();
        assert_eq!(err, GapError::LedgerHole { expected: 2, found: 1 });
    }
}
