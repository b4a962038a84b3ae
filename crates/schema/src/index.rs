/// A secondary index. Indexes owned by a primary-key, unique or exclusion
/// constraint are represented by the constraint instead.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    /// Key columns or expressions, in index order.
    pub columns: Vec<String>,
    pub unique: bool,
    /// Access method (`btree`, `gin`, ...).
    pub method: String,
    /// `WHERE` clause of a partial index.
    pub predicate: Option<String>,
}
