// src/error.rs

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("resource not found: {}", path.display())]
    ResourceMissing { path: PathBuf },

    #[error("{}: {message}", path.display())]
    SchemaMismatch { path: PathBuf, message: String },

    #[error("failed to extract text: {0}")]
    Extraction(String),

    #[error("failed to write report {}: {message}", path.display())]
    Write { path: PathBuf, message: String },

    #[error("failed to read spreadsheet {}: {source}", path.display())]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid unit marker pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn schema(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::SchemaMismatch {
            path: path.into(),
            message: message.into(),
        }
    }
}
