//! Run configuration, read from the environment and threaded explicitly
//! through the pipeline. Nothing here is held at module scope.

use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{0}`")]
    MissingVar(&'static str),
    #[error("`{var}` is not a valid {expected}: {value}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// One source dataset: the working table it loads and the spreadsheet id the
/// raw payload comes from.
#[derive(Debug, Clone)]
pub struct DatasetSource {
    pub table: &'static str,
    pub sheet_id: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// MySQL server URL; the ephemeral schema is not part of it.
    pub database_url: String,
    /// Name of the ephemeral working schema, dropped at run end.
    pub database: String,
    pub pool_size: u32,
    /// The three source datasets, in load order.
    pub sources: Vec<DatasetSource>,
    /// Worksheet name on every source spreadsheet.
    pub source_worksheet: String,
    /// Spreadsheet receiving the published summaries.
    pub output_spreadsheet: String,
    /// Access token for the destination API, supplied by the environment.
    pub sheets_token: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let required = |var: &'static str| env::var(var).map_err(|_| ConfigError::MissingVar(var));

        let pool_size = match env::var("DB_POOL_SIZE") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: "DB_POOL_SIZE",
                expected: "integer",
                value: raw,
            })?,
            Err(_) => 5,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database: env::var("ETL_DATABASE").unwrap_or_else(|_| "rm_shortage".into()),
            pool_size,
            sources: vec![
                DatasetSource {
                    table: "recv",
                    sheet_id: required("RECV_SHEET_ID")?,
                },
                DatasetSource {
                    table: "issues",
                    sheet_id: required("ISSUES_SHEET_ID")?,
                },
                DatasetSource {
                    table: "adjust",
                    sheet_id: required("ADJUST_SHEET_ID")?,
                },
            ],
            source_worksheet: env::var("SOURCE_WORKSHEET").unwrap_or_else(|_| "Sheet1".into()),
            output_spreadsheet: required("OUTPUT_SPREADSHEET_ID")?,
            sheets_token: required("SHEETS_TOKEN")?,
        })
    }
}
