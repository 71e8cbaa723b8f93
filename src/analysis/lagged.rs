//! Lagged panel construction
//!
//! Rebuilds a panel so that each explanatory column is shifted by its own
//! best Granger lag. Shifting leaves the first `lag` cells of a column
//! undefined, so the builder drops the first `max(selected lags)` rows of
//! the whole panel — a global truncation, not per column, so every
//! retained row is fully defined across all shifted columns.

use tracing::info;

use super::granger::{select_best_lag, DEFAULT_MAX_LAG};
use super::AnalysisError;
use crate::data::Panel;

/// Selected lag for one explanatory column.
#[derive(Debug, Clone)]
pub struct LagAssignment {
    /// Original column name
    pub column: String,
    /// Selected lag in months
    pub lag: usize,
    /// p-value of the winning Granger test
    pub p_value: f64,
}

/// Panel with lag-shifted explanatory columns plus the assignments that
/// produced it.
#[derive(Debug, Clone)]
pub struct LaggedPanel {
    pub panel: Panel,
    pub assignments: Vec<LagAssignment>,
    /// The global truncation depth (largest selected lag)
    pub max_selected_lag: usize,
}

impl LaggedPanel {
    /// Names of the shifted columns, `{column}_lag{k}`.
    pub fn shifted_names(&self) -> Vec<String> {
        self.assignments
            .iter()
            .map(|a| format!("{}_lag{}", a.column, a.lag))
            .collect()
    }

    /// Text table of the lag assignments.
    pub fn lag_report(&self) -> String {
        let mut s = String::new();
        s.push_str("Selected Lags\n");
        s.push_str("=============\n\n");
        for a in &self.assignments {
            s.push_str(&format!(
                "  {:36} lag {:>2}  (p = {:.6})\n",
                a.column, a.lag, a.p_value
            ));
        }
        s
    }
}

/// Shift a dense column by `lag`: the value at row i becomes the original
/// value at row i - lag, with the first `lag` cells undefined.
pub fn shift_with_lag(values: &[f64], lag: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| if i < lag { None } else { Some(values[i - lag]) })
        .collect()
}

/// Builds a lagged panel from a source panel, one target column and a set
/// of candidate explanatory columns.
#[derive(Debug, Clone)]
pub struct LaggedPanelBuilder {
    max_lag: usize,
}

impl Default for LaggedPanelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LaggedPanelBuilder {
    pub fn new() -> Self {
        Self {
            max_lag: DEFAULT_MAX_LAG,
        }
    }

    /// Override the lag search bound (default 12).
    pub fn with_max_lag(mut self, max_lag: usize) -> Self {
        self.max_lag = max_lag;
        self
    }

    /// Build the lagged panel. Fails as a whole if any candidate column's
    /// lag selection fails; no partial panel is returned.
    pub fn build(
        &self,
        panel: &Panel,
        target: &str,
        candidates: &[String],
    ) -> Result<LaggedPanel, AnalysisError> {
        if candidates.is_empty() {
            return Err(AnalysisError::NoCandidates);
        }

        let y = panel.column_dense(target)?;

        let mut assignments = Vec::with_capacity(candidates.len());
        let mut shifted_columns = Vec::with_capacity(candidates.len());
        for name in candidates {
            let x = panel.column_dense(name)?;
            let best = select_best_lag(&x, &y, self.max_lag)?;
            info!(
                column = %name,
                lag = best.lag,
                p_value = best.p_value,
                "selected lag"
            );
            shifted_columns.push(shift_with_lag(&x, best.lag));
            assignments.push(LagAssignment {
                column: name.clone(),
                lag: best.lag,
                p_value: best.p_value,
            });
        }

        let max_selected_lag = assignments
            .iter()
            .map(|a| a.lag)
            .max()
            .expect("candidates are non-empty");

        let mut lagged = Panel::from_dates(panel.dates().to_vec())
            .with_column(target.to_string(), y.into_iter().map(Some).collect())?;
        for (assignment, values) in assignments.iter().zip(shifted_columns) {
            let name = format!("{}_lag{}", assignment.column, assignment.lag);
            lagged = lagged.with_column(name, values)?;
        }

        Ok(LaggedPanel {
            panel: lagged.drop_first_rows(max_selected_lag),
            assignments,
            max_selected_lag,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TimeSeries;
    use chrono::NaiveDate;

    fn monthly(name: &str, values: &[f64]) -> TimeSeries {
        let points: Vec<(NaiveDate, f64)> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                (
                    NaiveDate::from_ymd_opt(2000 + (i / 12) as i32, (i % 12) as u32 + 1, 1)
                        .unwrap(),
                    v,
                )
            })
            .collect();
        TimeSeries::new(name, points).unwrap()
    }

    /// Target follows candidate A with lag 1 and candidate B with lag 2.
    fn build_panel(n: usize) -> Panel {
        let a: Vec<f64> = (0..n).map(|t| (0.8 * t as f64).sin()).collect();
        let b: Vec<f64> = (0..n)
            .map(|t| (0.31 * t as f64 + 0.7).sin() + 0.4 * (1.7 * t as f64).cos())
            .collect();
        let y: Vec<f64> = (0..n)
            .map(|t| {
                let noise = 0.2 * (2.3 * t as f64 + 0.1).sin();
                let mut v = noise;
                if t >= 1 {
                    v += a[t - 1];
                }
                if t >= 2 {
                    v += 0.8 * b[t - 2];
                }
                v
            })
            .collect();

        Panel::from_series(&monthly("Y", &y))
            .inner_join(&Panel::from_series(&monthly("A", &a)))
            .unwrap()
            .inner_join(&Panel::from_series(&monthly("B", &b)))
            .unwrap()
    }

    #[test]
    fn test_shift_with_lag() {
        let shifted = shift_with_lag(&[1.0, 2.0, 3.0, 4.0, 5.0], 2);
        assert_eq!(
            shifted,
            vec![None, None, Some(1.0), Some(2.0), Some(3.0)]
        );
    }

    #[test]
    fn test_shift_with_zero_lag_is_identity() {
        let shifted = shift_with_lag(&[1.0, 2.0], 0);
        assert_eq!(shifted, vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_row_count_and_no_undefined_cells() {
        let panel = build_panel(80);
        let built = LaggedPanelBuilder::new()
            .with_max_lag(4)
            .build(&panel, "Y", &["A".to_string(), "B".to_string()])
            .unwrap();

        assert_eq!(
            built.panel.n_rows(),
            panel.n_rows() - built.max_selected_lag
        );
        for name in built.panel.column_names() {
            // column_dense fails on any undefined cell.
            assert!(built.panel.column_dense(name).is_ok(), "column {name}");
        }
    }

    #[test]
    fn test_recovers_per_column_lags() {
        let panel = build_panel(80);
        let built = LaggedPanelBuilder::new()
            .with_max_lag(4)
            .build(&panel, "Y", &["A".to_string(), "B".to_string()])
            .unwrap();

        let lag_a = built.assignments.iter().find(|a| a.column == "A").unwrap();
        let lag_b = built.assignments.iter().find(|a| a.column == "B").unwrap();
        assert_eq!(lag_a.lag, 1);
        assert_eq!(lag_b.lag, 2);
        assert_eq!(built.max_selected_lag, 2);
        assert!(built.panel.has_column("A_lag1"));
        assert!(built.panel.has_column("B_lag2"));
    }

    #[test]
    fn test_shifted_values_align_with_source() {
        let panel = build_panel(80);
        let built = LaggedPanelBuilder::new()
            .with_max_lag(4)
            .build(&panel, "Y", &["A".to_string(), "B".to_string()])
            .unwrap();

        let source_a = panel.column_dense("A").unwrap();
        let shifted_a = built.panel.column_dense("A_lag1").unwrap();
        let m = built.max_selected_lag;
        // Row i of the truncated panel is source row i + m; its lag-1
        // value is source row i + m - 1.
        for (i, &v) in shifted_a.iter().enumerate() {
            assert_eq!(v, source_a[i + m - 1]);
        }
    }

    #[test]
    fn test_failure_is_total() {
        let n = 30;
        let panel = build_panel(n);
        // A candidate too short for lag 12 selection fails the whole build.
        let result = LaggedPanelBuilder::new().build(
            &panel,
            "Y",
            &["A".to_string(), "B".to_string()],
        );
        assert!(matches!(
            result,
            Err(AnalysisError::InsufficientObservations { .. })
        ));
    }

    #[test]
    fn test_no_candidates_rejected() {
        let panel = build_panel(40);
        assert!(matches!(
            LaggedPanelBuilder::new().build(&panel, "Y", &[]),
            Err(AnalysisError::NoCandidates)
        ));
    }
}
