//! Ordinary Least Squares regression
//!
//! Solves the normal equations by Cholesky decomposition. A singular
//! design matrix is a fatal error: the run stops so the operator can fix
//! the inputs, rather than falling back to an approximate solution.

use ndarray::{s, Array1, Array2, Axis};

use super::RegressionError;

/// Linear regression model fitted by Ordinary Least Squares.
#[derive(Debug, Clone)]
pub struct LinearRegression {
    /// Coefficients (weights) for each feature
    pub coefficients: Option<Array1<f64>>,
    /// Intercept (bias) term
    pub intercept: Option<f64>,
    /// Whether to fit an intercept
    fit_intercept: bool,
    /// R-squared score on the training data
    pub r_squared: Option<f64>,
    /// Adjusted R-squared on the training data
    pub adj_r_squared: Option<f64>,
    /// Number of training observations
    pub n_obs: Option<usize>,
    /// Feature names
    pub feature_names: Option<Vec<String>>,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new(true)
    }
}

impl LinearRegression {
    /// Create a new model.
    ///
    /// # Arguments
    /// * `fit_intercept` - Whether to calculate the intercept
    pub fn new(fit_intercept: bool) -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept,
            r_squared: None,
            adj_r_squared: None,
            n_obs: None,
            feature_names: None,
        }
    }

    /// Set feature names for interpretation
    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = Some(names);
        self
    }

    /// Fit the model using Ordinary Least Squares
    ///
    /// Solves the normal equations: β = (X'X)^(-1) X'y
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), RegressionError> {
        if x.nrows() != y.len() {
            return Err(RegressionError::DimensionMismatch {
                expected: x.nrows(),
                got: y.len(),
            });
        }
        if x.nrows() == 0 {
            return Err(RegressionError::EmptyDesign);
        }

        let x_design = if self.fit_intercept {
            let ones = Array2::ones((x.nrows(), 1));
            ndarray::concatenate(Axis(1), &[ones.view(), x.view()])
                .map_err(|e| RegressionError::Computation(e.to_string()))?
        } else {
            x.clone()
        };

        let xt = x_design.t();
        let xtx = xt.dot(&x_design);
        let xty = xt.dot(y);

        let beta = solve_normal_equations(&xtx, &xty)?;

        if self.fit_intercept {
            self.intercept = Some(beta[0]);
            self.coefficients = Some(beta.slice(s![1..]).to_owned());
        } else {
            self.intercept = Some(0.0);
            self.coefficients = Some(beta);
        }

        let predictions = self.predict(x)?;
        let n = y.len() as f64;
        let p = x.ncols() as f64;
        let y_mean = y.sum() / n;
        let ss_tot: f64 = y.iter().map(|&yi| (yi - y_mean).powi(2)).sum();
        let ss_res: f64 = y
            .iter()
            .zip(predictions.iter())
            .map(|(&yi, &pi)| (yi - pi).powi(2))
            .sum();

        let r2 = if ss_tot > 1e-12 {
            1.0 - ss_res / ss_tot
        } else {
            0.0
        };
        self.r_squared = Some(r2);
        self.adj_r_squared = if n - p - 1.0 > 0.0 {
            Some(1.0 - (1.0 - r2) * (n - 1.0) / (n - p - 1.0))
        } else {
            None
        };
        self.n_obs = Some(y.len());

        Ok(())
    }

    /// Residual sum of squares of the fitted model on (x, y).
    pub fn residual_sum_of_squares(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<f64, RegressionError> {
        let predictions = self.predict(x)?;
        Ok(y.iter()
            .zip(predictions.iter())
            .map(|(&yi, &pi)| (yi - pi).powi(2))
            .sum())
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, RegressionError> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or(RegressionError::NotFitted)?;
        let intercept = self.intercept.ok_or(RegressionError::NotFitted)?;

        if x.ncols() != coefficients.len() {
            return Err(RegressionError::DimensionMismatch {
                expected: coefficients.len(),
                got: x.ncols(),
            });
        }

        Ok(x.dot(coefficients) + intercept)
    }

    /// Text summary: coefficient table plus fit statistics.
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str("OLS Regression Summary\n");
        s.push_str("======================\n\n");

        if let Some(ref coef) = self.coefficients {
            if let Some(n) = self.n_obs {
                s.push_str(&format!("Observations: {}\n", n));
            }
            s.push_str(&format!(
                "Intercept: {:.6}\n\nCoefficients:\n",
                self.intercept.unwrap_or(0.0)
            ));

            if let Some(ref names) = self.feature_names {
                for (i, (name, &c)) in names.iter().zip(coef.iter()).enumerate() {
                    s.push_str(&format!("  {:3}. {:36} {:>12.6}\n", i + 1, name, c));
                }
            } else {
                for (i, &c) in coef.iter().enumerate() {
                    s.push_str(&format!("  {:3}. Feature {:2}: {:>12.6}\n", i + 1, i, c));
                }
            }

            s.push_str(&format!("\nR-squared:     {:.6}\n", self.r_squared.unwrap_or(0.0)));
            if let Some(adj) = self.adj_r_squared {
                s.push_str(&format!("Adj R-squared: {:.6}\n", adj));
            }
        } else {
            s.push_str("Model not fitted yet.\n");
        }

        s
    }
}

/// Solve a symmetric positive definite system via Cholesky decomposition.
///
/// A rank-deficient Gram matrix (exactly collinear columns) fails the
/// decomposition and is reported as [`RegressionError::SingularMatrix`].
pub(crate) fn solve_normal_equations(
    xtx: &Array2<f64>,
    xty: &Array1<f64>,
) -> Result<Array1<f64>, RegressionError> {
    let n = xtx.nrows();
    let a = xtx;

    // Cholesky decomposition: A = L * L^T
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 1e-10 * a[[i, i]].abs().max(1.0) {
                    return Err(RegressionError::SingularMatrix);
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // Solve L * z = b (forward substitution)
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * z[j];
        }
        z[i] = (xty[i] - sum) / l[[i, i]];
    }

    // Solve L^T * x = z (backward substitution)
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (z[i] - sum) / l[[i, i]];
    }

    Ok(x)
}
