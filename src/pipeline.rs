//! End-to-end analysis pipeline
//!
//! One batch run, executed top to bottom: load the four sources, build the
//! monthly stance panel, merge in the factor premia, then run the
//! contemporaneous and lagged regressions. Every stage takes the previous
//! stage's output as an explicit input and returns a new value; nothing is
//! mutated in place across stages, and any stage failure aborts the run.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::analysis::{LaggedPanel, LaggedPanelBuilder, DEFAULT_MAX_LAG};
use crate::data::loader;
use crate::data::{Panel, TimeSeries};
use crate::metrics::RegressionMetrics;
use crate::models::{
    variance_inflation_factors, vif_report, LinearRegression, StepwiseSelector, StepwiseResult,
    VifScore,
};
use crate::stance::{compute_stance, StanceInputs};

/// Name of the derived target column.
pub const STANCE_COLUMN: &str = "MPSTANCE";

/// Inputs and knobs of a full analysis run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Monthly federal funds rate CSV
    pub fed_funds: PathBuf,
    /// Quarterly Laubach-Williams neutral real rate CSV
    pub neutral_rate: PathBuf,
    /// Quarterly SPF 10-year inflation expectations CSV
    pub inflation_expectations: PathBuf,
    /// Century-of-factor-premia monthly returns CSV
    pub factor_premia: PathBuf,
    /// Preamble rows before the factor premia header
    pub premia_skip_rows: usize,
    /// Explanatory columns are the premia columns strictly before this
    /// one (the sheet's per-asset-class breakdown starts there); all
    /// columns when `None`.
    pub feature_cutoff: Option<String>,
    /// Granger lag search bound
    pub max_lag: usize,
    /// Folds for the cross-validated stepwise pass
    pub cv_folds: usize,
}

impl PipelineConfig {
    pub fn new(
        fed_funds: PathBuf,
        neutral_rate: PathBuf,
        inflation_expectations: PathBuf,
        factor_premia: PathBuf,
    ) -> Self {
        Self {
            fed_funds,
            neutral_rate,
            inflation_expectations,
            factor_premia,
            premia_skip_rows: 18,
            feature_cutoff: Some("All Stock Selection Value".to_string()),
            max_lag: DEFAULT_MAX_LAG,
            cv_folds: 5,
        }
    }
}

/// Everything a run produces, kept for rendering and assertions.
#[derive(Debug)]
pub struct AnalysisReport {
    /// The derived stance series
    pub stance: TimeSeries,
    /// Descriptive statistics of the merged monthly panel
    pub panel_description: String,
    /// Rows in the merged monthly panel
    pub panel_rows: usize,
    /// Full OLS on the contemporaneous panel
    pub ols: LinearRegression,
    /// Stepwise selection on the contemporaneous panel (in-sample scoring)
    pub stepwise: StepwiseResult,
    /// Lag assignments and the truncated lagged panel
    pub lagged: LaggedPanel,
    /// Full OLS on the lagged panel
    pub lagged_ols: LinearRegression,
    /// In-sample fit metrics of the lagged OLS
    pub lagged_metrics: RegressionMetrics,
    /// Stepwise selection on the lagged panel (in-sample scoring)
    pub lagged_stepwise: StepwiseResult,
    /// Stepwise re-run with k-fold CV scoring, as an overfitting check
    pub lagged_stepwise_cv: StepwiseResult,
    /// Collinearity diagnostics on the lagged explanatory columns
    pub vif: Vec<VifScore>,
}

impl AnalysisReport {
    /// Render the whole run as the printed report.
    pub fn render(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!(
            "Stance of monetary policy: {} monthly observations\n\n",
            self.stance.len()
        ));
        s.push_str("Merged monthly panel\n====================\n\n");
        s.push_str(&self.panel_description);
        s.push('\n');

        s.push_str("I. Contemporaneous factor premia\n");
        s.push_str("--------------------------------\n\n");
        s.push_str(&self.ols.summary());
        s.push('\n');
        s.push_str(&self.stepwise.report());
        s.push('\n');

        s.push_str("II. Lagged factor premia\n");
        s.push_str("------------------------\n\n");
        s.push_str(&self.lagged.lag_report());
        s.push('\n');
        s.push_str(&self.lagged_ols.summary());
        s.push('\n');
        s.push_str(&self.lagged_metrics.report());
        s.push('\n');
        s.push_str(&self.lagged_stepwise.report());
        s.push('\n');
        s.push_str(&vif_report(&self.vif));
        s.push('\n');
        s.push_str("III. Cross-validated stepwise (overfitting check)\n");
        s.push_str("-------------------------------------------------\n\n");
        s.push_str(&self.lagged_stepwise_cv.report());
        s
    }
}

/// Load the three stance inputs and the factor premia panel.
pub fn load_inputs(config: &PipelineConfig) -> Result<(StanceInputs, Panel)> {
    let fed_funds = loader::load_fed_funds(&config.fed_funds)?;
    info!(rows = fed_funds.len(), "loaded federal funds rate");

    let neutral_rate = loader::load_neutral_rate(&config.neutral_rate)?;
    info!(rows = neutral_rate.len(), "loaded neutral real rate");

    let inflation_expectations =
        loader::load_inflation_expectations(&config.inflation_expectations)?;
    info!(
        rows = inflation_expectations.len(),
        "loaded inflation expectations"
    );

    let premia = loader::load_factor_premia(&config.factor_premia, config.premia_skip_rows)?;
    info!(
        rows = premia.n_rows(),
        columns = premia.n_cols(),
        "loaded factor premia"
    );

    Ok((
        StanceInputs {
            fed_funds,
            neutral_rate,
            inflation_expectations,
        },
        premia,
    ))
}

/// Explanatory columns: everything strictly before the cutoff column.
pub fn premia_feature_columns(
    premia: &Panel,
    cutoff: Option<&str>,
) -> Result<Vec<String>> {
    let names = premia.column_names();
    match cutoff {
        None => Ok(names.to_vec()),
        Some(cutoff) => {
            let position = names.iter().position(|n| n == cutoff).with_context(|| {
                format!("feature cutoff column {cutoff:?} not found in factor premia")
            })?;
            if position == 0 {
                bail!("feature cutoff column {cutoff:?} leaves no explanatory columns");
            }
            Ok(names[..position].to_vec())
        }
    }
}

/// Run the whole analysis.
pub fn run(config: &PipelineConfig) -> Result<AnalysisReport> {
    let (inputs, premia) = load_inputs(config)?;

    let stance = compute_stance(&inputs).context("failed to compute the stance series")?;

    let features = premia_feature_columns(&premia, config.feature_cutoff.as_deref())?;
    info!(features = features.len(), "selected explanatory columns");

    let monthly = Panel::from_series(&stance)
        .inner_join(&premia)
        .context("failed to merge stance with factor premia")?;
    if monthly.n_rows() == 0 {
        bail!("stance and factor premia have no overlapping months");
    }
    info!(rows = monthly.n_rows(), "merged monthly panel");
    let panel_description = monthly.describe();

    // Contemporaneous regressions.
    let dataset = monthly.to_dataset(STANCE_COLUMN, &features)?;
    let mut ols = LinearRegression::new(true).with_feature_names(features.clone());
    ols.fit(&dataset.x, &dataset.y)
        .context("contemporaneous OLS failed")?;
    info!(r_squared = ols.r_squared, "fitted contemporaneous OLS");

    let stepwise = StepwiseSelector::new(0)
        .fit(&dataset.x, &dataset.y, &features)
        .context("contemporaneous stepwise selection failed")?;

    // Lag selection and the lagged panel.
    let lagged = LaggedPanelBuilder::new()
        .with_max_lag(config.max_lag)
        .build(&monthly, STANCE_COLUMN, &features)
        .context("lagged panel construction failed")?;
    info!(
        rows = lagged.panel.n_rows(),
        max_lag = lagged.max_selected_lag,
        "built lagged panel"
    );

    let shifted = lagged.shifted_names();
    let lagged_dataset = lagged.panel.to_dataset(STANCE_COLUMN, &shifted)?;

    let mut lagged_ols = LinearRegression::new(true).with_feature_names(shifted.clone());
    lagged_ols
        .fit(&lagged_dataset.x, &lagged_dataset.y)
        .context("lagged OLS failed")?;
    info!(r_squared = lagged_ols.r_squared, "fitted lagged OLS");
    let lagged_predictions = lagged_ols.predict(&lagged_dataset.x)?;
    let lagged_metrics =
        RegressionMetrics::calculate(&lagged_dataset.y, &lagged_predictions, Some(shifted.len()));

    let lagged_stepwise = StepwiseSelector::new(0)
        .fit(&lagged_dataset.x, &lagged_dataset.y, &shifted)
        .context("lagged stepwise selection failed")?;

    // VIF needs at least two columns to inflate against.
    let vif = if shifted.len() >= 2 {
        variance_inflation_factors(&lagged_dataset.x, &shifted)
            .context("VIF computation failed")?
    } else {
        Vec::new()
    };

    let lagged_stepwise_cv = StepwiseSelector::new(config.cv_folds)
        .fit(&lagged_dataset.x, &lagged_dataset.y, &shifted)
        .context("cross-validated stepwise selection failed")?;

    Ok(AnalysisReport {
        stance,
        panel_description,
        panel_rows: monthly.n_rows(),
        ols,
        stepwise,
        lagged,
        lagged_ols,
        lagged_metrics,
        lagged_stepwise,
        lagged_stepwise_cv,
        vif,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Months, NaiveDate};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn synthetic_config(dir: &tempfile::TempDir, n_months: usize) -> PipelineConfig {
        let start = NaiveDate::from_ymd_opt(1992, 1, 1).unwrap();
        let months: Vec<NaiveDate> = (0..n_months)
            .map(|i| start.checked_add_months(Months::new(i as u32)).unwrap())
            .collect();

        let mut ffr = String::from("observation_date,FEDFUNDS\n");
        for (i, date) in months.iter().enumerate() {
            let t = i as f64;
            let rate = 5.0 + (0.5 * t).sin() + 0.3 * (1.3 * t).cos();
            ffr.push_str(&format!("{date},{rate}\n"));
        }

        let mut rstar = String::from("Date,rstar\n");
        let mut spf = String::from("YEAR,QUARTER,INFCPI10YR\n");
        for (i, date) in months.iter().enumerate().step_by(3) {
            let value = 2.0 + 0.05 * (i / 3) as f64;
            rstar.push_str(&format!("{date},{value}\n"));
            let quarter = (date.month() - 1) / 3 + 1;
            spf.push_str(&format!("{},{},1.5\n", date.year(), quarter));
        }

        let mut premia = String::from("Date,US Value,US Momentum,All Stock Selection Value\n");
        for (i, date) in months.iter().enumerate() {
            let t = i as f64;
            premia.push_str(&format!(
                "{date},{},{},{}\n",
                (0.8 * t).sin() * 0.02,
                ((0.31 * t + 0.7).sin() + 0.4 * (1.7 * t).cos()) * 0.02,
                (0.11 * t).cos() * 0.02,
            ));
        }

        let mut config = PipelineConfig::new(
            write_file(dir, "fedfunds.csv", &ffr),
            write_file(dir, "r_star.csv", &rstar),
            write_file(dir, "spf.csv", &spf),
            write_file(dir, "premia.csv", &premia),
        );
        config.premia_skip_rows = 0;
        config.max_lag = 2;
        config.cv_folds = 3;
        config
    }

    #[test]
    fn test_feature_cutoff_selection() {
        let dir = tempdir().unwrap();
        let config = synthetic_config(&dir, 12);
        let (_, premia) = load_inputs(&config).unwrap();

        let all = premia_feature_columns(&premia, None).unwrap();
        assert_eq!(all.len(), 3);

        let cut = premia_feature_columns(&premia, Some("All Stock Selection Value")).unwrap();
        assert_eq!(
            cut,
            vec!["US Value".to_string(), "US Momentum".to_string()]
        );

        assert!(premia_feature_columns(&premia, Some("Missing")).is_err());
    }

    #[test]
    fn test_full_run() {
        let dir = tempdir().unwrap();
        let config = synthetic_config(&dir, 48);

        let report = run(&config).unwrap();

        // The stance anchors where all three components exist.
        assert_eq!(report.stance.len(), 48);
        assert_eq!(report.panel_rows, 48);

        // Both regressions fitted, with sane statistics.
        assert!(report.ols.r_squared.unwrap().is_finite());
        assert!(report.lagged_ols.r_squared.unwrap().is_finite());

        // One lag assignment per explanatory column, within bounds.
        assert_eq!(report.lagged.assignments.len(), 2);
        for assignment in &report.lagged.assignments {
            assert!((1..=2).contains(&assignment.lag));
            assert!((0.0..=1.0).contains(&assignment.p_value));
        }
        assert_eq!(
            report.lagged.panel.n_rows(),
            report.panel_rows - report.lagged.max_selected_lag
        );

        // VIF for every shifted column.
        assert_eq!(report.vif.len(), 2);

        let rendered = report.render();
        assert!(rendered.contains("Selected Lags"));
        assert!(rendered.contains("Variance Inflation Factors"));
    }

    #[test]
    fn test_stance_formula_on_first_row() {
        let dir = tempdir().unwrap();
        let config = synthetic_config(&dir, 12);
        let (inputs, _) = load_inputs(&config).unwrap();

        let stance = compute_stance(&inputs).unwrap();
        let first_ffr = inputs.fed_funds.values().next().unwrap();
        let first_rstar = inputs.neutral_rate.values().next().unwrap();
        let first_inflation = inputs.inflation_expectations.values().next().unwrap();

        let expected = first_ffr - (first_rstar + first_inflation);
        assert!((stance.values().next().unwrap() - expected).abs() < 1e-12);
    }
}
