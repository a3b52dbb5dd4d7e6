use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LabError>;

#[derive(Debug, Error)]
pub enum LabError {
    #[error("unsupported file format: {} (expected .csv or .xlsx)", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] calamine::Error),

    #[error("workbook {} has no worksheet", path.display())]
    EmptyWorkbook { path: PathBuf },

    #[error("missing required columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("row {row}: invalid number in column {column}: {value:?}")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    #[error("unknown market: {0}")]
    UnknownMarket(String),

    #[error("invalid rule {strategy}: {reason}")]
    InvalidRule { strategy: String, reason: String },

    #[error("invalid config: {0}")]
    Config(String),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl LabError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by the shape of the input data rather than
    /// by the file itself being unreadable.
    pub fn is_missing_columns(&self) -> bool {
        matches!(self, Self::MissingColumns { .. })
    }
}
