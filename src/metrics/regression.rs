//! Regression metrics
//!
//! Fit statistics shared by the OLS reports and the stepwise selector's
//! out-of-fold scoring.

use ndarray::Array1;

/// Collection of regression metrics
#[derive(Debug, Clone)]
pub struct RegressionMetrics {
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// R-squared (coefficient of determination)
    pub r2: f64,
    /// Adjusted R-squared
    pub adj_r2: Option<f64>,
    /// Number of samples
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Calculate all metrics; adjusted R² needs the feature count.
    pub fn calculate(
        y_true: &Array1<f64>,
        y_pred: &Array1<f64>,
        n_features: Option<usize>,
    ) -> Self {
        let n = y_true.len();

        let mse = Self::mean_squared_error(y_true, y_pred);
        let mae = Self::mean_absolute_error(y_true, y_pred);
        let r2 = Self::r_squared(y_true, y_pred);

        let adj_r2 = n_features.and_then(|p| {
            let n_f = n as f64;
            let p_f = p as f64;
            if n_f - p_f - 1.0 > 0.0 {
                Some(1.0 - (1.0 - r2) * (n_f - 1.0) / (n_f - p_f - 1.0))
            } else {
                None
            }
        });

        Self {
            mse,
            rmse: mse.sqrt(),
            mae,
            r2,
            adj_r2,
            n_samples: n,
        }
    }

    /// Mean Squared Error: (1/n) * Σ(y_true - y_pred)²
    pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        let n = y_true.len() as f64;
        y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(&t, &p)| (t - p).powi(2))
            .sum::<f64>()
            / n
    }

    /// Mean Absolute Error: (1/n) * Σ|y_true - y_pred|
    pub fn mean_absolute_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        let n = y_true.len() as f64;
        y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(&t, &p)| (t - p).abs())
            .sum::<f64>()
            / n
    }

    /// R-squared (coefficient of determination)
    /// R² = 1 - SS_res / SS_tot
    pub fn r_squared(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        let y_mean = y_true.mean().unwrap_or(0.0);

        let ss_res: f64 = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(&t, &p)| (t - p).powi(2))
            .sum();

        let ss_tot: f64 = y_true.iter().map(|&t| (t - y_mean).powi(2)).sum();

        if ss_tot < 1e-10 {
            return 0.0;
        }

        1.0 - ss_res / ss_tot
    }

    /// Print a summary report
    pub fn report(&self) -> String {
        let mut s = String::new();
        s.push_str("Regression Metrics\n");
        s.push_str("==================\n\n");
        s.push_str(&format!("Samples:   {}\n", self.n_samples));
        s.push_str(&format!("MSE:       {:.6}\n", self.mse));
        s.push_str(&format!("RMSE:      {:.6}\n", self.rmse));
        s.push_str(&format!("MAE:       {:.6}\n", self.mae));
        s.push_str(&format!("R²:        {:.6}\n", self.r2));
        if let Some(adj_r2) = self.adj_r2 {
            s.push_str(&format!("Adj R²:    {:.6}\n", adj_r2));
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mse_zero_for_perfect_fit() {
        let y_true = Array1::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let y_pred = y_true.clone();

        let mse = RegressionMetrics::mean_squared_error(&y_true, &y_pred);
        assert!(mse.abs() < 1e-10);
    }

    #[test]
    fn test_r_squared_perfect() {
        let y_true = Array1::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let y_pred = y_true.clone();

        let r2 = RegressionMetrics::r_squared(&y_true, &y_pred);
        assert!((r2 - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_r_squared_mean_predictor_is_zero() {
        let y_true = Array1::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let y_pred = Array1::from_elem(5, 3.0);

        let r2 = RegressionMetrics::r_squared(&y_true, &y_pred);
        assert!(r2.abs() < 1e-10);
    }

    #[test]
    fn test_adjusted_r_squared_penalizes_features() {
        let y_true = Array1::from_vec(vec![1.0, 2.1, 2.9, 4.2, 4.8, 6.1]);
        let y_pred = Array1::from_vec(vec![1.1, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let metrics = RegressionMetrics::calculate(&y_true, &y_pred, Some(2));
        assert!(metrics.adj_r2.unwrap() < metrics.r2);
    }
}
