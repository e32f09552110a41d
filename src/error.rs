use std::path::PathBuf;

use thiserror::Error;

use crate::data::model::TableId;

/// A table source could not be turned into a [`Table`](crate::data::model::Table).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("Malformed CSV in '{path}': {source}", path = path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Malformed JSON in '{path}': {source}", path = path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed parquet in '{path}': {source}", path = path.display())]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Malformed table '{origin}': {message}")]
    Malformed { origin: String, message: String },
}

/// A caller asked for a column the table does not have.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown field '{field}' in table '{table}'")]
pub struct UnknownFieldError {
    pub table: String,
    pub field: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config '{path}': {source}", path = path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to load the {table} table: {source}")]
    Load {
        table: TableId,
        #[source]
        source: LoadError,
    },

    #[error(transparent)]
    UnknownField(#[from] UnknownFieldError),

    #[error("Row {row} is out of range for the {table} table ({len} rows)")]
    RowOutOfRange { table: String, row: usize, len: usize },

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
