//! Monetary policy stance
//!
//! The stance measure is the federal funds rate minus the nominal
//! neutral rate, where the neutral rate is the Laubach-Williams neutral
//! real rate plus SPF 10-year inflation expectations:
//!
//! `MPSTANCE[t] = FEDFUNDS[t] - (RSTAR[t] + INFCPI10YR[t])`
//!
//! The quarterly components are forward-filled onto the monthly fed funds
//! index; months before both components are observed are discarded.

use tracing::info;

use crate::data::{DataError, Panel, TimeSeries};

/// The three aligned inputs of the stance measure.
#[derive(Debug, Clone)]
pub struct StanceInputs {
    /// Monthly federal funds rate.
    pub fed_funds: TimeSeries,
    /// Quarterly Laubach-Williams neutral real rate.
    pub neutral_rate: TimeSeries,
    /// Quarterly SPF 10-year inflation expectations.
    pub inflation_expectations: TimeSeries,
}

/// Merge the three inputs onto the monthly grid and compute the stance.
///
/// The monthly index is anchored at the later first observation of the two
/// quarterly components, so every retained row has all three values after
/// forward fill. Component columns are dropped from the result.
pub fn compute_stance(inputs: &StanceInputs) -> Result<TimeSeries, DataError> {
    let ffr_name = inputs.fed_funds.name().to_string();
    let rstar_name = inputs.neutral_rate.name().to_string();
    let infl_name = inputs.inflation_expectations.name().to_string();

    let rstar_start = inputs
        .neutral_rate
        .first_date()
        .ok_or_else(|| DataError::EmptySeries(rstar_name.clone()))?;
    let inflation_start = inputs
        .inflation_expectations
        .first_date()
        .ok_or_else(|| DataError::EmptySeries(infl_name.clone()))?;
    let anchor = rstar_start.max(inflation_start);

    let fed_funds = inputs.fed_funds.truncate_before(anchor);
    if fed_funds.is_empty() {
        return Err(DataError::EmptySeries(ffr_name));
    }
    info!(
        anchor = %anchor,
        months = fed_funds.len(),
        "anchored stance panel at first common observation"
    );

    let panel = Panel::from_series(&fed_funds)
        .left_join_ffill(&inputs.neutral_rate)?
        .left_join_ffill(&inputs.inflation_expectations)?;

    let ffr = panel.column_dense(&ffr_name)?;
    let rstar = panel.column_dense(&rstar_name)?;
    let inflation = panel.column_dense(&infl_name)?;

    let points = panel
        .dates()
        .iter()
        .enumerate()
        .map(|(i, &date)| (date, ffr[i] - (rstar[i] + inflation[i])))
        .collect::<Vec<_>>();

    TimeSeries::new("MPSTANCE", points)
}
