//! Lag analysis: Granger causality search and lagged panel construction

pub mod granger;
pub mod lagged;

use thiserror::Error;

pub use granger::{granger_causality, select_best_lag, GrangerTest, DEFAULT_MAX_LAG};
pub use lagged::{shift_with_lag, LagAssignment, LaggedPanel, LaggedPanelBuilder};

/// Errors from the lag analysis layer.
///
/// All of these abort the computation they occur in; a failed lag search
/// for one column fails the whole lagged panel build.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("series length mismatch: x has {x} observations, y has {y}")]
    LengthMismatch { x: usize, y: usize },

    #[error("series {series} has a non-finite value at index {index}")]
    NonFiniteValue { series: &'static str, index: usize },

    #[error("lag {lag} needs at least {needed} observations, got {got}")]
    InsufficientObservations {
        lag: usize,
        needed: usize,
        got: usize,
    },

    #[error("invalid lag bound: {0}")]
    InvalidLag(usize),

    #[error("no candidate columns to lag")]
    NoCandidates,

    #[error("F distribution error: {0}")]
    Distribution(String),

    #[error(transparent)]
    Regression(#[from] crate::models::RegressionError),

    #[error(transparent)]
    Data(#[from] crate::data::DataError),
}
