//! Data layer: time series, panels and source loaders

pub mod loader;
pub mod panel;
pub mod series;

use chrono::NaiveDate;
use thiserror::Error;

pub use panel::{Dataset, Panel};
pub use series::TimeSeries;

/// Shape and alignment errors in the data layer.
///
/// These are all fatal: the run is a one-shot batch computation and bad
/// inputs are surfaced to the operator instead of being repaired.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("column not found: {0}")]
    MissingColumn(String),

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("column {column}: expected {expected} rows, got {got}")]
    LengthMismatch {
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("column {column} has {count} undefined cells")]
    UndefinedCells { column: String, count: usize },

    #[error("series {series}: dates not strictly increasing at {date}")]
    UnorderedDates { series: String, date: NaiveDate },

    #[error("series {0} has no observations")]
    EmptySeries(String),

    #[error("date arithmetic overflow past {0}")]
    DateOverflow(NaiveDate),
}
