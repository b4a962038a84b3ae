use core::fmt;

/// Whether a run changes the database or only reports what it would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    Apply,
    /// Validate and list pending scripts; no transaction is opened.
    DryRun,
}

impl ExecutionMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            ExecutionMode::DryRun
        } else {
            ExecutionMode::Apply
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Apply => "apply",
            ExecutionMode::DryRun => "dry-run",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
