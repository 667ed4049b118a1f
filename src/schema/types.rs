use serde::{Deserialize, Serialize};

/// Storage type for one column, inferred once from the observed values and
/// carried as data from then on.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ColumnType {
    Text,
    Integer,
    Decimal,
    Boolean,
    Timestamp,
}

impl ColumnType {
    /// MySQL column type this maps to.
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Text => "VARCHAR(255)",
            ColumnType::Integer => "BIGINT",
            ColumnType::Decimal => "DECIMAL(18,6)",
            ColumnType::Boolean => "TINYINT(1)",
            ColumnType::Timestamp => "DATETIME",
        }
    }
}

/// A single column definition of a working table.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Hash)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

/// Ordered schema for one working table.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<Column>,
}
