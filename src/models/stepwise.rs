//! Forward stepwise feature selection
//!
//! Greedy forward search: at each step, add the candidate feature whose
//! inclusion gives the best R². With `folds >= 2` the score is the mean
//! out-of-fold R² over deterministic k-fold splits; with fewer folds it is
//! the in-sample R² of the full fit. The reported subset is the prefix of
//! the search path with the best recorded score, so later additions that
//! only hurt the score are dropped.

use ndarray::{Array1, Array2, Axis};
use tracing::debug;

use super::cross_validation::{k_fold, CVScores};
use super::linear::LinearRegression;
use super::RegressionError;
use crate::metrics::RegressionMetrics;

/// One addition in the forward search path.
#[derive(Debug, Clone)]
pub struct StepwiseStep {
    /// Feature added at this step
    pub feature: String,
    /// Score of the subset after the addition
    pub score: f64,
}

/// Outcome of a stepwise selection run.
#[derive(Debug, Clone)]
pub struct StepwiseResult {
    /// Features kept, in the order they were added
    pub selected: Vec<String>,
    /// Features not kept, in original column order
    pub dropped: Vec<String>,
    /// Score of the selected subset
    pub best_score: f64,
    /// Full forward search path
    pub path: Vec<StepwiseStep>,
}

impl StepwiseResult {
    /// Text summary in the style of the OLS report.
    pub fn report(&self) -> String {
        let mut s = String::new();
        s.push_str("Stepwise Selection\n");
        s.push_str("==================\n\n");
        s.push_str(&format!(
            "Selected {} of {} features (score {:.6}):\n",
            self.selected.len(),
            self.selected.len() + self.dropped.len(),
            self.best_score
        ));
        for name in &self.selected {
            s.push_str(&format!("  + {}\n", name));
        }
        if self.dropped.is_empty() {
            s.push_str("\nNo features were dropped during stepwise regression.\n");
        } else {
            s.push_str(&format!("\nDropped features: {:?}\n", self.dropped));
        }
        s
    }
}

/// Forward stepwise selector scored by R².
#[derive(Debug, Clone)]
pub struct StepwiseSelector {
    /// Number of CV folds; below 2 the score is in-sample R²
    folds: usize,
}

impl StepwiseSelector {
    pub fn new(folds: usize) -> Self {
        Self { folds }
    }

    /// Run the forward search over all features.
    pub fn fit(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        feature_names: &[String],
    ) -> Result<StepwiseResult, RegressionError> {
        if feature_names.len() != x.ncols() {
            return Err(RegressionError::DimensionMismatch {
                expected: x.ncols(),
                got: feature_names.len(),
            });
        }
        if x.ncols() == 0 {
            return Err(RegressionError::EmptyDesign);
        }

        let mut remaining: Vec<usize> = (0..x.ncols()).collect();
        let mut current: Vec<usize> = Vec::new();
        let mut path: Vec<StepwiseStep> = Vec::new();

        while !remaining.is_empty() {
            let mut best: Option<(usize, f64)> = None;

            for (pos, &candidate) in remaining.iter().enumerate() {
                let mut subset = current.clone();
                subset.push(candidate);
                let score = self.score_subset(x, y, &subset)?;
                let better = match best {
                    None => true,
                    Some((_, best_score)) => score > best_score,
                };
                if better {
                    best = Some((pos, score));
                }
            }

            let (pos, score) = best.expect("remaining is non-empty");
            let added = remaining.remove(pos);
            current.push(added);
            debug!(
                feature = %feature_names[added],
                score,
                subset_size = current.len(),
                "stepwise addition"
            );
            path.push(StepwiseStep {
                feature: feature_names[added].clone(),
                score,
            });
        }

        // Best prefix of the path; ties resolve to the smaller subset.
        let mut best_len = 1;
        let mut best_score = path[0].score;
        for (i, step) in path.iter().enumerate().skip(1) {
            if step.score > best_score {
                best_score = step.score;
                best_len = i + 1;
            }
        }

        let selected: Vec<String> = path[..best_len]
            .iter()
            .map(|step| step.feature.clone())
            .collect();
        let dropped: Vec<String> = feature_names
            .iter()
            .filter(|name| !selected.contains(name))
            .cloned()
            .collect();

        Ok(StepwiseResult {
            selected,
            dropped,
            best_score,
            path,
        })
    }

    fn score_subset(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        columns: &[usize],
    ) -> Result<f64, RegressionError> {
        let x_subset = x.select(Axis(1), columns);

        if self.folds < 2 {
            let mut model = LinearRegression::new(true);
            model.fit(&x_subset, y)?;
            return Ok(model.r_squared.unwrap_or(0.0));
        }

        if y.len() < self.folds {
            return Err(RegressionError::Computation(format!(
                "{} samples cannot be split into {} folds",
                y.len(),
                self.folds
            )));
        }
        let splits = k_fold(y.len(), self.folds);
        let mut scores = Vec::with_capacity(splits.len());
        for split in &splits {
            let (x_train, y_train, x_test, y_test) = split.partition(&x_subset, y);
            let mut model = LinearRegression::new(true);
            model.fit(&x_train, &y_train)?;
            let predictions = model.predict(&x_test)?;
            scores.push(RegressionMetrics::r_squared(&y_test, &predictions));
        }

        Ok(CVScores::from_scores(scores).mean)
    }
}
