//! # Factor Premia and the Stance of Monetary Policy
//!
//! This library measures the stance of US monetary policy as the federal
//! funds rate in excess of its neutral level (the Laubach-Williams neutral
//! real rate plus SPF 10-year inflation expectations) and relates it to
//! long-horizon factor premia with lagged regressions.
//!
//! ## Modules
//!
//! - `data` - Time series, monthly panels and CSV source loaders
//! - `stance` - The MPSTANCE construction
//! - `analysis` - Granger lag selection and the lagged panel builder
//! - `models` - OLS, stepwise selection, cross-validation, VIF diagnostics
//! - `metrics` - Regression evaluation metrics
//! - `pipeline` - The end-to-end batch run

pub mod analysis;
pub mod data;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod stance;

pub use analysis::{granger_causality, select_best_lag, LaggedPanelBuilder};
pub use data::{Panel, TimeSeries};
pub use metrics::RegressionMetrics;
pub use models::{variance_inflation_factors, LinearRegression, StepwiseSelector};
pub use pipeline::{AnalysisReport, PipelineConfig};
pub use stance::compute_stance;
