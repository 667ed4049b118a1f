//! Statement builders and identifier quoting for the MySQL sink.
//!
//! SQL has no placeholder form for identifiers, so every dynamic table or
//! column name is funneled through this module: normalized names are already
//! `[A-Za-z0-9_]+`, and backtick quoting covers reserved words on top.

use crate::schema::TableSchema;

/// True when `name` is a plain identifier the pipeline will accept.
pub fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Backtick-quote an identifier for MySQL, doubling embedded backticks.
pub fn quote(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn qualified(db: &str, table: &str) -> String {
    format!("{}.{}", quote(db), quote(table))
}

pub fn create_database(db: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", quote(db))
}

pub fn drop_database(db: &str) -> String {
    format!("DROP DATABASE IF EXISTS {}", quote(db))
}

pub fn drop_table(db: &str, table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", qualified(db, table))
}

pub fn create_table(db: &str, schema: &TableSchema) -> String {
    debug_assert!(is_safe_identifier(&schema.table), "table {:?}", schema.table);
    debug_assert!(schema.columns.iter().all(|c| is_safe_identifier(&c.name)));
    let cols = schema
        .columns
        .iter()
        .map(|c| format!("{} {}", quote(&c.name), c.ty.sql_type()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({})", qualified(db, &schema.table), cols)
}

/// Single-row INSERT with one `?` placeholder per column; the sink binds one
/// row per execution inside its batch transaction.
pub fn insert_row(db: &str, schema: &TableSchema) -> String {
    debug_assert!(is_safe_identifier(&schema.table), "table {:?}", schema.table);
    debug_assert!(schema.columns.iter().all(|c| is_safe_identifier(&c.name)));
    let cols = schema
        .columns
        .iter()
        .map(|c| quote(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; schema.columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        qualified(db, &schema.table),
        cols,
        placeholders
    )
}

/// Grouped month-to-date summary over one working table. Every selected
/// column is cast to CHAR so results decode as a uniform text grid whatever
/// types inference picked (an all-numeric Code column would otherwise come
/// back as BIGINT and fail the text decode), ready for the spreadsheet.
pub fn grouped_summary(
    db: &str,
    table: &str,
    qty_column: &str,
    value_column: &str,
    window_start: &str,
    window_end: &str,
) -> String {
    format!(
        "SELECT CAST(Company AS CHAR) AS Company, \
         CAST(Product AS CHAR) AS Product, \
         CAST(Code AS CHAR) AS Code, \
         CAST(Issued_On AS CHAR) AS Issued_On, \
         CAST(SUM({qty}) AS CHAR) AS Total_{qty_name}, \
         CAST(SUM({value}) AS CHAR) AS Total_{value_name} \
         FROM {table} \
         WHERE Issued_On BETWEEN '{start}' AND '{end}' \
         GROUP BY Company, Product, Code, Issued_On \
         ORDER BY Issued_On DESC, Company DESC",
        qty = quote(qty_column),
        qty_name = qty_column,
        value = quote(value_column),
        value_name = value_column,
        table = qualified(db, table),
        start = window_start,
        end = window_end,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnType};

    fn schema() -> TableSchema {
        TableSchema {
            table: "recv".into(),
            columns: vec![
                Column {
                    name: "Issued_On".into(),
                    ty: ColumnType::Timestamp,
                },
                Column {
                    name: "ReceiveQty".into(),
                    ty: ColumnType::Integer,
                },
            ],
        }
    }

    #[test]
    fn safe_identifiers() {
        assert!(is_safe_identifier("recv"));
        assert!(is_safe_identifier("Issued_On"));
        assert!(!is_safe_identifier(""));
        assert!(!is_safe_identifier("a-b"));
        assert!(!is_safe_identifier("a b"));
        assert!(!is_safe_identifier("x; DROP TABLE y"));
    }

    #[test]
    fn quoting_escapes_backticks() {
        assert_eq!(quote("recv"), "`recv`");
        assert_eq!(quote("we`ird"), "`we``ird`");
    }

    #[test]
    fn create_table_lists_columns_in_order() {
        let sql = create_table("rm_shortage", &schema());
        assert_eq!(
            sql,
            "CREATE TABLE `rm_shortage`.`recv` \
             (`Issued_On` DATETIME, `ReceiveQty` BIGINT)"
        );
    }

    #[test]
    fn drop_statements_are_idempotent() {
        assert_eq!(
            drop_table("rm_shortage", "recv"),
            "DROP TABLE IF EXISTS `rm_shortage`.`recv`"
        );
        assert_eq!(
            drop_database("rm_shortage"),
            "DROP DATABASE IF EXISTS `rm_shortage`"
        );
    }

    #[test]
    fn insert_has_one_placeholder_per_column() {
        let sql = insert_row("rm_shortage", &schema());
        assert_eq!(
            sql,
            "INSERT INTO `rm_shortage`.`recv` (`Issued_On`, `ReceiveQty`) VALUES (?, ?)"
        );
    }

    #[test]
    fn grouped_summary_orders_and_bounds() {
        let sql = grouped_summary(
            "rm_shortage",
            "issues",
            "IssueQty",
            "IssueValue",
            "2025-08-01 00:00:00",
            "2025-08-30 12:00:00",
        );
        assert!(sql.contains("SUM(`IssueQty`) AS CHAR) AS Total_IssueQty"));
        assert!(sql.starts_with("SELECT CAST(Company AS CHAR) AS Company"));
        assert!(sql.contains("FROM `rm_shortage`.`issues`"));
        assert!(sql.contains(
            "WHERE Issued_On BETWEEN '2025-08-01 00:00:00' AND '2025-08-30 12:00:00'"
        ));
        assert!(sql.contains("GROUP BY Company, Product, Code, Issued_On"));
        assert!(sql.ends_with("ORDER BY Issued_On DESC, Company DESC"));
    }

    // Group columns may infer as numeric (an all-digit Code is plausible SKU
    // data); every selected column must come back as CHAR so the sink's text
    // decode never sees a numeric wire type.
    #[test]
    fn grouped_summary_casts_every_group_column() {
        let sql = grouped_summary("db", "recv", "ReceiveQty", "ReceiveValue", "a", "b");
        for col in ["Company", "Product", "Code", "Issued_On"] {
            assert!(
                sql.contains(&format!("CAST({col} AS CHAR) AS {col}")),
                "{col} not cast in: {sql}"
            );
        }
    }
}
