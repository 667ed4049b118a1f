pub mod derive;
pub mod types;

pub use derive::{derive_schema, SchemaError};
pub use types::{Column, ColumnType, TableSchema};
