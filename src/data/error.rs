use thiserror::Error;

use super::model::{CellValue, ColumnKind};

/// Failure to turn uploaded content into a record table. Fatal for the session.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("file is not valid UTF-8 text")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("file has no header row")]
    MissingHeader,
    #[error("CSV row {row}: expected at most {expected} fields, saw {found}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("parsing CSV: {0}")]
    Parse(#[from] csv::Error),
}

/// A filter selection that cannot apply to the loaded schema.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("filter on '{column}' selects {value:?}, which cannot occur in a {kind} column")]
    IncompatibleValue {
        column: String,
        value: CellValue,
        kind: ColumnKind,
    },
}

/// An aggregation that could not be computed from the table it was given.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("column '{column}' holds {found} values, expected {expected}")]
    WrongKind {
        column: String,
        expected: ColumnKind,
        found: ColumnKind,
    },
    #[error("column '{column}' has a non-finite range and cannot be binned")]
    UnbinnableRange { column: String },
    #[error("histogram needs at least one bin")]
    NoBins,
}
