//! Collinearity diagnostics
//!
//! Variance inflation factors: each feature is regressed on all the other
//! features (no intercept, uncentered R², matching the convention of the
//! usual econometrics implementations) and `VIF = 1 / (1 - R²)`.

use ndarray::{Array2, Axis};

use super::linear::solve_normal_equations;
use super::RegressionError;

/// VIF for one feature.
#[derive(Debug, Clone)]
pub struct VifScore {
    pub feature: String,
    pub vif: f64,
}

impl VifScore {
    /// Conventional screening threshold.
    pub fn is_concerning(&self) -> bool {
        self.vif > 5.0
    }
}

/// Variance inflation factor for every column of `x`.
///
/// A feature that is an exact linear combination of the others gets
/// `f64::INFINITY`. A single-column design has nothing to inflate against
/// and is rejected.
pub fn variance_inflation_factors(
    x: &Array2<f64>,
    feature_names: &[String],
) -> Result<Vec<VifScore>, RegressionError> {
    if feature_names.len() != x.ncols() {
        return Err(RegressionError::DimensionMismatch {
            expected: x.ncols(),
            got: feature_names.len(),
        });
    }
    if x.ncols() < 2 {
        return Err(RegressionError::EmptyDesign);
    }

    let mut scores = Vec::with_capacity(x.ncols());
    for j in 0..x.ncols() {
        let others: Vec<usize> = (0..x.ncols()).filter(|&c| c != j).collect();
        let x_others = x.select(Axis(1), &others);
        let target = x.column(j).to_owned();

        let r2 = fit_auxiliary(&x_others, &target)?;

        let vif = if 1.0 - r2 < 1e-12 {
            f64::INFINITY
        } else {
            1.0 / (1.0 - r2)
        };

        scores.push(VifScore {
            feature: feature_names[j].clone(),
            vif,
        });
    }

    Ok(scores)
}

/// Uncentered R² of regressing `target` on `x` without an intercept.
///
/// When the auxiliary design is itself exactly collinear (so the plain
/// solve fails), the system is re-solved with a small ridge penalty; the
/// resulting R² coincides with the minimum-norm least-squares fit.
fn fit_auxiliary(
    x: &Array2<f64>,
    target: &ndarray::Array1<f64>,
) -> Result<f64, RegressionError> {
    let xt = x.t();
    let xtx = xt.dot(x);
    let xty = xt.dot(target);

    let beta = match solve_normal_equations(&xtx, &xty) {
        Ok(beta) => beta,
        Err(RegressionError::SingularMatrix) => {
            let mut ridge = xtx.clone();
            for i in 0..ridge.nrows() {
                ridge[[i, i]] += 1e-8 * ridge[[i, i]].abs().max(1e-8);
            }
            solve_normal_equations(&ridge, &xty)?
        }
        Err(e) => return Err(e),
    };

    let residuals = target - &x.dot(&beta);
    let ss_res: f64 = residuals.iter().map(|&r| r * r).sum();
    let ss_tot: f64 = target.iter().map(|&v| v * v).sum();
    if ss_tot < 1e-12 {
        return Ok(0.0);
    }
    Ok(1.0 - ss_res / ss_tot)
}

/// Text table of VIF scores.
pub fn vif_report(scores: &[VifScore]) -> String {
    let mut s = String::new();
    s.push_str("Variance Inflation Factors\n");
    s.push_str("==========================\n\n");
    for score in scores {
        let flag = if score.is_concerning() { "  <- high" } else { "" };
        s.push_str(&format!("  {:36} {:>10.4}{}\n", score.feature, score.vif, flag));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_uncorrelated_features_have_low_vif() {
        let n = 50;
        let mut x = Array2::zeros((n, 2));
        for i in 0..n {
            let t = i as f64;
            x[[i, 0]] = (t * 0.7).sin();
            x[[i, 1]] = (t * 0.7).cos();
        }
        let names = vec!["a".to_string(), "b".to_string()];

        let scores = variance_inflation_factors(&x, &names).unwrap();
        assert_eq!(scores.len(), 2);
        for score in &scores {
            assert!(score.vif < 5.0, "vif {} too high", score.vif);
            assert!(!score.is_concerning());
        }
    }

    #[test]
    fn test_exactly_collinear_feature_is_infinite() {
        let n = 30;
        let mut x = Array2::zeros((n, 3));
        for i in 0..n {
            let t = i as f64;
            x[[i, 0]] = (t * 0.3).sin();
            x[[i, 1]] = (t * 0.9).cos();
            x[[i, 2]] = 2.0 * x[[i, 0]]; // exact copy, scaled
        }
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let scores = variance_inflation_factors(&x, &names).unwrap();
        assert!(scores[0].vif.is_infinite());
        assert!(scores[2].vif.is_infinite());
        assert!(scores[1].vif.is_finite());
    }

    #[test]
    fn test_single_column_rejected() {
        let x = Array2::zeros((10, 1));
        let names = vec!["only".to_string()];
        assert!(variance_inflation_factors(&x, &names).is_err());
    }
}
