use std::path::PathBuf;

use thiserror::Error;

/// Domain errors raised while turning catalog tables into report pages.
#[derive(Debug, Error)]
pub enum QaError {
    #[error("unsupported table format '.{extension}' ({path}); expected csv, json or parquet")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("{table} row {row}: missing required column '{column}'")]
    MissingColumn {
        table: &'static str,
        row: usize,
        column: String,
    },

    #[error("{table} row {row}: column '{column}' has invalid value '{value}'")]
    InvalidValue {
        table: &'static str,
        row: usize,
        column: String,
        value: String,
    },

    #[error("no exposures to report on")]
    NoExposures,
}

pub type Result<T> = std::result::Result<T, QaError>;
