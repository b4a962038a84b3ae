use crate::error::GapError;
use crate::model::MigrationScript;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPlan<'a> {
    pub current_version: i64,
    pub pending: Vec<&'a MigrationScript>,
    pub already_applied: usize,
}

impl PendingPlan<'_> {
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn target_version(&self) -> i64 {
        self.pending
            .last()
            .map(|s| s.sequence)
            .unwrap_or(self.current_version)
    }
}

/// Computes the scripts that still have to run on a database whose ledger is
/// at `current_version`.
///
/// The whole plan is validated up front: the pending sequences must be exactly
/// `current_version + 1, current_version + 2, ...`, so a missing or misnumbered
/// file is reported before any transaction is opened.
pub fn plan_pending(
    scripts: &[MigrationScript],
    current_version: i64,
) -> Result<PendingPlan<'_>, GapError> {
    let mut ordered: Vec<&MigrationScript> = scripts.iter().collect();
    ordered.sort_by_key(|s| s.sequence);

    for pair in ordered.windows(2) {
        if pair[0].sequence == pair[1].sequence {
            return Err(GapError::DuplicateSequence {
                sequence: pair[0].sequence,
                first: pair[0].filename.clone(),
                second: pair[1].filename.clone(),
            });
        }
    }

    if let Some(first) = ordered.first() {
        if first.sequence <= 0 {
            return Err(GapError::InvalidSequence {
                sequence: first.sequence,
                name: first.name.clone(),
            });
        }
    }

    if current_version > 0 && !ordered.iter().any(|s| s.sequence == current_version) {
        return Err(GapError::UnknownLedgerVersion { current_version });
    }

    let already_applied = ordered
        .iter()
        .take_while(|s| s.sequence <= current_version)
        .count();
    let pending: Vec<&MigrationScript> = ordered[already_applied..].to_vec();

    let mut expected = current_version + 1;
    for s in &pending {
        if s.sequence != expected {
            return Err(GapError::NonContiguous {
                current_version,
                expected,
                found: s.sequence,
                name: s.name.clone(),
            });
        }
        expected += 1;
    }

    Ok(PendingPlan {
        current_version,
        pending,
        already_applied,
    })
}
