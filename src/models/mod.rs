//! Regression models and model-selection tooling

pub mod cross_validation;
pub mod diagnostics;
pub mod linear;
pub mod stepwise;

use thiserror::Error;

pub use cross_validation::{k_fold, CVScores, CVSplit};
pub use diagnostics::{variance_inflation_factors, vif_report, VifScore};
pub use linear::LinearRegression;
pub use stepwise::{StepwiseResult, StepwiseSelector};

/// Errors from the regression layer.
#[derive(Error, Debug)]
pub enum RegressionError {
    #[error("design matrix is singular and cannot be inverted")]
    SingularMatrix,

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("design matrix has no rows or no columns")]
    EmptyDesign,

    #[error("model has not been fitted yet")]
    NotFitted,

    #[error("computation error: {0}")]
    Computation(String),
}
