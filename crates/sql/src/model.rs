#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    /// 1-based position inside the script.
    pub ordinal: i32,
    pub sql: String,
}
