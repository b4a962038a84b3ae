/// Whether an error means "the session is gone or timed out" rather than
/// "the statement is wrong". Only the former is worth retrying.
pub fn is_connection_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Protocol(_) => true,
        sqlx::Error::Database(db) => db.code().is_some_and(|c| is_connection_sqlstate(&c)),
        _ => false,
    }
}

pub fn is_connection_sqlstate(code: &str) -> bool {
    // 08xxx connection exception, 57P01..57P03 shutdown / cannot connect now,
    // 57014 query_canceled (statement_timeout expiry).
    code.starts_with("08") || matches!(code, "57P01" | "57P02" | "57P03" | "57014")
}

#[cfg(test)]
mod tests {
    use super::{is_connection_error, is_connection_sqlstate};

    #[test]
    fn sqlstate_classes() {
        assert!(is_connection_sqlstate("08006"));
        assert!(is_connection_sqlstate("57014"));
        assert!(is_connection_sqlstate("57P01"));
        assert!(!is_connection_sqlstate("42P01"));
        assert!(!is_connection_sqlstate("23505"));
    }

    #[test]
    fn pool_and_io_errors_are_transient() {
        assert!(is_connection_error(&sqlx::Error::PoolTimedOut));
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(is_connection_error(&sqlx::Error::Io(io)));
        assert!(!is_connection_error(&sqlx::Error::RowNotFound));
    }
}
