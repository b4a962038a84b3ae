use std::fmt;

/// First line at which two dumps disagree.
///
/// `line` is 1-based. A side is `None` when that dump has already ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpMismatch {
    pub line: usize,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl fmt::Display for DumpMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |s: &Option<String>| match s {
            Some(text) => format!("{text:?}"),
            None => "<end of dump>".to_string(),
        };

        write!(
            f,
            "line {}: expected {}, found {}",
            self.line,
            side(&self.expected),
            side(&self.actual)
        )
    }
}

/// Byte-compares two dumps and reports the first differing line.
///
/// Lines are split on `\n` only, so a missing trailing newline or a stray
/// `\r` is reported rather than silently tolerated.
pub fn compare_dumps(expected: &str, actual: &str) -> Option<DumpMismatch> {
    if expected == actual {
        return None;
    }

    let mut expected_lines = expected.split('\n');
    let mut actual_lines = actual.split('\n');
    let mut line = 0;

    loop {
        line += 1;
        match (expected_lines.next(), actual_lines.next()) {
            (Some(e), Some(a)) if e == a => continue,
            (None, None) => return None,
            (e, a) => {
                return Some(DumpMismatch {
                    line,
                    expected: e.map(str::to_string),
                    actual: a.map(str::to_string),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_dumps_match() {
        assert_eq!(compare_dumps("table a\n", "table a\n"), None);
    }

    #[test]
    fn reports_first_differing_line() {
        let expected = "table a\n  column id integer not null\n  column name text\n";
        let actual = "table a\n  column id bigint not null\n  column name text\n";

        let mismatch = compare_dumps(expected, actual).expect("dumps differ");
        assert_eq!(mismatch.line, 2);
        assert_eq!(
            mismatch.expected.as_deref(),
            Some("  column id integer not null")
        );
        assert_eq!(mismatch.actual.as_deref(), Some("  column id bigint not null"));
    }

    #[test]
    fn extra_trailing_content_is_a_mismatch() {
        let mismatch = compare_dumps("table a\n", "table a\n\ntable b\n").expect("dumps differ");
        assert_eq!(mismatch.line, 3);
        assert_eq!(mismatch.expected, None);
        assert_eq!(mismatch.actual.as_deref(), Some("table b"));
    }

    #[test]
    fn missing_final_newline_is_a_mismatch() {
        let mismatch = compare_dumps("table a\n", "table a").expect("dumps differ");
        assert_eq!(mismatch.line, 2);
        assert_eq!(mismatch.expected.as_deref(), Some(""));
        assert_eq!(mismatch.actual, None);
        assert!(mismatch.to_string().contains("<end of dump>"));
    }
}
