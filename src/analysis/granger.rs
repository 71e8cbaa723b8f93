//! Granger causality and best-lag search
//!
//! For a candidate explanatory series X and target Y, the test at lag k
//! compares a restricted autoregression of Y on its own k lags against an
//! unrestricted model that also includes k lags of X. The F statistic for
//! the added terms
//!
//! `F = ((RSS_r - RSS_u) / k) / (RSS_u / dfd)`,  `dfd = (n - k) - (2k + 1)`
//!
//! gives a p-value from the Fisher-Snedecor distribution. The best lag for
//! a pair is the first k in 1..=max_lag with the strictly smallest p-value.

use ndarray::{Array1, Array2};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};
use tracing::debug;

use super::AnalysisError;
use crate::models::LinearRegression;

/// Lag search bound used throughout the analysis (12 months).
pub const DEFAULT_MAX_LAG: usize = 12;

/// Result of one Granger causality F-test.
#[derive(Debug, Clone, PartialEq)]
pub struct GrangerTest {
    /// Lag at which the test was run
    pub lag: usize,
    /// F statistic for the added X lags
    pub f_statistic: f64,
    /// p-value of the F statistic
    pub p_value: f64,
}

fn validate_series(name: &'static str, values: &[f64]) -> Result<(), AnalysisError> {
    for (index, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            return Err(AnalysisError::NonFiniteValue {
                series: name,
                index,
            });
        }
    }
    Ok(())
}

/// Test whether k lags of `x` help predict `y` beyond `y`'s own k lags.
///
/// Inputs must be equal-length, fully finite and long enough for the
/// unrestricted model's degrees of freedom; anything else is a fatal error
/// for the pair, never silently skipped.
pub fn granger_causality(x: &[f64], y: &[f64], lag: usize) -> Result<GrangerTest, AnalysisError> {
    if lag == 0 {
        return Err(AnalysisError::InvalidLag(lag));
    }
    if x.len() != y.len() {
        return Err(AnalysisError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    validate_series("x", x)?;
    validate_series("y", y)?;

    let n = y.len();
    let rows = n.saturating_sub(lag);
    let unrestricted_params = 2 * lag + 1;
    if rows <= unrestricted_params {
        return Err(AnalysisError::InsufficientObservations {
            lag,
            needed: lag + unrestricted_params + 1,
            got: n,
        });
    }
    let dfd = (rows - unrestricted_params) as f64;

    // Dependent variable: y_t for t = lag..n.
    let y_dep: Array1<f64> = y[lag..].iter().copied().collect();

    // Restricted design: y's own lags. Unrestricted adds x's lags.
    let mut x_restricted = Array2::zeros((rows, lag));
    let mut x_unrestricted = Array2::zeros((rows, 2 * lag));
    for r in 0..rows {
        let t = lag + r;
        for i in 1..=lag {
            x_restricted[[r, i - 1]] = y[t - i];
            x_unrestricted[[r, i - 1]] = y[t - i];
            x_unrestricted[[r, lag + i - 1]] = x[t - i];
        }
    }

    let mut restricted = LinearRegression::new(true);
    restricted.fit(&x_restricted, &y_dep)?;
    let rss_r = restricted.residual_sum_of_squares(&x_restricted, &y_dep)?;

    let mut unrestricted = LinearRegression::new(true);
    unrestricted.fit(&x_unrestricted, &y_dep)?;
    let rss_u = unrestricted.residual_sum_of_squares(&x_unrestricted, &y_dep)?;

    if rss_u < 1e-12 {
        // Perfect unrestricted fit: the added lags leave no residual.
        return Ok(GrangerTest {
            lag,
            f_statistic: f64::INFINITY,
            p_value: 0.0,
        });
    }

    let f_statistic = (((rss_r - rss_u) / lag as f64) / (rss_u / dfd)).max(0.0);
    let dist = FisherSnedecor::new(lag as f64, dfd)
        .map_err(|e| AnalysisError::Distribution(e.to_string()))?;
    let p_value = (1.0 - dist.cdf(f_statistic)).clamp(0.0, 1.0);

    debug!(lag, f_statistic, p_value, "granger causality test");

    Ok(GrangerTest {
        lag,
        f_statistic,
        p_value,
    })
}

/// Scan lags 1..=max_lag and return the test with the smallest p-value.
///
/// The scan is in increasing lag order with a strict `<` comparison, so on
/// exact ties the earliest lag wins. Any failing per-lag test aborts the
/// whole search.
pub fn select_best_lag(x: &[f64], y: &[f64], max_lag: usize) -> Result<GrangerTest, AnalysisError> {
    if max_lag == 0 {
        return Err(AnalysisError::InvalidLag(max_lag));
    }

    let mut best: Option<GrangerTest> = None;
    for lag in 1..=max_lag {
        let test = granger_causality(x, y, lag)?;
        let better = match &best {
            None => true,
            Some(current) => test.p_value < current.p_value,
        };
        if better {
            best = Some(test);
        }
    }

    // max_lag >= 1, so at least one test ran.
    Ok(best.expect("at least one lag was tested"))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// y follows x with a 3-month delay plus a deterministic disturbance.
    fn lagged_pair(n: usize) -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..n)
            .map(|t| {
                let t = t as f64;
                (0.9 * t).sin() + 0.5 * (0.23 * t + 1.0).sin()
            })
            .collect();
        let y: Vec<f64> = (0..n)
            .map(|t| {
                let noise = 0.3 * (2.1 * t as f64 + 0.5).sin();
                if t >= 3 {
                    x[t - 3] + noise
                } else {
                    noise
                }
            })
            .collect();
        (x, y)
    }

    #[test]
    fn test_p_value_in_unit_interval() {
        let (x, y) = lagged_pair(100);
        for lag in 1..=12 {
            let test = granger_causality(&x, &y, lag).unwrap();
            assert!(test.p_value >= 0.0 && test.p_value <= 1.0, "lag {lag}");
            assert!(test.f_statistic >= 0.0);
        }
    }

    #[test]
    fn test_recovers_true_lag() {
        let (x, y) = lagged_pair(100);
        let best = select_best_lag(&x, &y, 12).unwrap();
        assert_eq!(best.lag, 3);
        assert!(best.p_value < 0.01);
    }

    #[test]
    fn test_best_lag_in_bounds() {
        let (x, y) = lagged_pair(100);
        let best = select_best_lag(&x, &y, 12).unwrap();
        assert!((1..=12).contains(&best.lag));
    }

    #[test]
    fn test_idempotent() {
        let (x, y) = lagged_pair(90);
        let a = select_best_lag(&x, &y, 12).unwrap();
        let b = select_best_lag(&x, &y, 12).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_nan_input_is_fatal() {
        let (x, mut y) = lagged_pair(60);
        y[10] = f64::NAN;
        assert!(matches!(
            granger_causality(&x, &y, 2),
            Err(AnalysisError::NonFiniteValue {
                series: "y",
                index: 10
            })
        ));
    }

    #[test]
    fn test_length_mismatch() {
        let (x, y) = lagged_pair(60);
        assert!(matches!(
            granger_causality(&x[..50], &y, 2),
            Err(AnalysisError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_too_short_series() {
        let (x, y) = lagged_pair(20);
        // lag 12 needs well over 20 observations.
        assert!(matches!(
            granger_causality(&x, &y, 12),
            Err(AnalysisError::InsufficientObservations { .. })
        ));
    }

    #[test]
    fn test_zero_lag_rejected() {
        let (x, y) = lagged_pair(30);
        assert!(matches!(
            granger_causality(&x, &y, 0),
            Err(AnalysisError::InvalidLag(0))
        ));
        assert!(matches!(
            select_best_lag(&x, &y, 0),
            Err(AnalysisError::InvalidLag(0))
        ));
    }
}
