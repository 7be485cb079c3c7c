// src/error.rs

use std::path::PathBuf;

/// Everything that can go wrong between opening a bulletin and writing its tables.
///
/// Variants up to `AggregationCardinalityError` are parsing-stage failures and are
/// fatal for the input being processed. The rest are raised by the export sinks
/// and only abort the table or destination they occurred in.
#[derive(Debug, thiserror::Error)]
pub enum BulletinError {
    #[error("cannot open source {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },

    #[error("sheet '{sheet}' not found (available: {available:?})")]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    #[error("column mapping error: {0}")]
    ColumnMappingError(String),

    #[error("invalid date format: '{0}'")]
    InvalidDateFormat(String),

    #[error("no date found in bulletin header: '{0}'")]
    DateNotFound(String),

    #[error("section marker '{marker}' not found exactly once in the expected order")]
    SectionMarkerNotFound { marker: String },

    #[error("malformed row {row}: field '{field}' has value '{value}'")]
    MalformedRow {
        row: u32,
        field: String,
        value: String,
    },

    #[error("facility id {id} appears more than once while joining occupancy")]
    AggregationCardinalityError { id: u32 },

    #[error("unsupported export format '{0}' (expected csv or json)")]
    UnsupportedFormat(String),

    #[error("invalid existence policy '{0}' (expected fail, ignore, force or update)")]
    InvalidPolicy(String),

    #[error("unknown table '{0}'")]
    UnknownTable(String),

    #[error("record {key} already exists in {destination}")]
    DuplicateRecord { destination: String, key: String },

    #[error("destination {destination} unavailable: {reason}")]
    DestinationUnavailable { destination: String, reason: String },

    #[error("destination {destination} rejected request with status {status}")]
    DestinationRejected { destination: String, status: u16 },

    #[error("missing credential: {0}")]
    MissingCredential(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl BulletinError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for BulletinError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<csv::Error> for BulletinError {
    fn from(e: csv::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BulletinError>;
