use crate::error::ConfigError;

const MAX_IDENTIFIER_LEN: usize = 63;

/// Validates an unquoted PostgreSQL identifier that will be interpolated into
/// SQL text (ledger table name, schema name).
pub fn validate_identifier(what: &'static str, value: &str) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidIdentifier {
        what,
        value: value.to_string(),
        reason,
    };

    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return Err(invalid("must not be empty"));
    };

    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(invalid("must be at most 63 bytes"));
    }

    if !(first.is_ascii_lowercase() || first == '_') {
        return Err(invalid("must start with a lowercase letter or underscore"));
    }

    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return Err(invalid("may only contain lowercase letters, digits and underscores"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_identifier;
    use crate::error::ConfigError;

    #[test]
    fn accepts_plain_identifiers() {
        assert!(validate_identifier("table", "schema_version").is_ok());
        assert!(validate_identifier("table", "_t1").is_ok());
    }

    #[test]
    fn rejects_quoting_and_case() {
        for bad in ["", "1abc", "Schema", "a-b", "a;drop table x", "a b"] {
            let err = validate_identifier("table", bad).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidIdentifier { .. }), "{bad}");
        }
    }

    #[test]
    fn rejects_overlong_identifier() {
        let name = "a".repeat(64);
        assert!(validate_identifier("schema", &name).is_err());
    }
}
