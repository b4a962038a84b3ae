use sha2::{Digest, Sha256};

/// Lower-case hex SHA-256 of a script body, exactly as stored on disk.
/// No newline normalization: a CRLF conversion counts as an edit.
pub fn sha256_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(bytes.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::sha256_hex;

    #[test]
    fn empty_body_matches_known_vector() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn line_endings_change_the_checksum() {
        let lf = sha256_hex("CREATE TABLE t (id int);\n");
        let crlf = sha256_hex("CREATE TABLE t (id int);\r\n");
        assert_ne!(lf, crlf);
        assert_eq!(lf.len(), 64);
    }
}
