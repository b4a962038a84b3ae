//! Structural model of a PostgreSQL schema and its canonical text dump.

mod column;
mod constraint;
mod diff;
mod dump;
mod error;
mod index;
mod introspect;
pub mod normalize;
mod render;
mod schema;
mod table;

pub use column::{Column, Identity};
pub use constraint::{Constraint, ConstraintKind, ReferentialAction};
pub use diff::{compare_dumps, DumpMismatch};
pub use dump::{dump, dump_connection, write_dump};
pub use error::SchemaError;
pub use index::Index;
pub use introspect::introspect;
pub use normalize::{normalize_schema, normalize_table};
pub use render::render;
pub use schema::{EnumType, Schema};
pub use table::Table;
