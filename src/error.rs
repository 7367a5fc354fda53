use std::path::PathBuf;

use crate::data::EntityType;

pub type Result<T, E = PrepError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("'{0}' is not a known record file")]
    UnknownEntity(String),

    #[error("'{path}' must hold a JSON array of objects: {reason}")]
    RecordShape { path: PathBuf, reason: String },

    #[error("Row length mismatch in '{path}' at line {line}: expected {expected} fields, found {found}")]
    RowLength {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Dataset has no {0} table")]
    MissingTable(EntityType),
}

impl PrepError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PrepError::Io { path: path.into(), source }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        PrepError::Csv { path: path.into(), source }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        PrepError::Json { path: path.into(), source }
    }
}
