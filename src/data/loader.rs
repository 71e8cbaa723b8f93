//! Source loaders
//!
//! Reads the four tabular inputs into typed form. Each source has its own
//! quirks carried over from the published spreadsheets: the SPF survey keys
//! dates by year and quarter, and the factor premia sheet opens with a
//! preamble of unnamed columns and empty rows before the real header.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Writer};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

use super::series::{quarter_start_month, TimeSeries};
use super::Panel;

#[derive(Debug, Deserialize)]
struct FedFundsRecord {
    observation_date: NaiveDate,
    #[serde(rename = "FEDFUNDS")]
    fed_funds: f64,
}

/// Load the monthly federal funds rate (`observation_date,FEDFUNDS`).
pub fn load_fed_funds<P: AsRef<Path>>(path: P) -> Result<TimeSeries> {
    let file = File::open(&path)
        .with_context(|| format!("failed to open fed funds file: {:?}", path.as_ref()))?;

    let mut reader = ReaderBuilder::new().from_reader(file);
    let mut points = Vec::new();
    for record in reader.deserialize() {
        let record: FedFundsRecord = record.context("failed to parse fed funds row")?;
        points.push((record.observation_date, record.fed_funds));
    }

    Ok(TimeSeries::new("FEDFUNDS", points)?)
}

#[derive(Debug, Deserialize)]
struct NeutralRateRecord {
    #[serde(rename = "Date")]
    date: NaiveDate,
    rstar: f64,
}

/// Load the Laubach-Williams neutral real rate (`Date,rstar`).
/// The column is renamed `RSTAR` to match the other sources.
pub fn load_neutral_rate<P: AsRef<Path>>(path: P) -> Result<TimeSeries> {
    let file = File::open(&path)
        .with_context(|| format!("failed to open neutral rate file: {:?}", path.as_ref()))?;

    let mut reader = ReaderBuilder::new().from_reader(file);
    let mut points = Vec::new();
    for record in reader.deserialize() {
        let record: NeutralRateRecord = record.context("failed to parse neutral rate row")?;
        points.push((record.date, record.rstar));
    }

    Ok(TimeSeries::new("RSTAR", points)?)
}

#[derive(Debug, Deserialize)]
struct InflationRecord {
    #[serde(rename = "YEAR")]
    year: i32,
    #[serde(rename = "QUARTER")]
    quarter: u32,
    #[serde(rename = "INFCPI10YR")]
    value: Option<f64>,
}

/// Load the SPF 10-year inflation expectations (`YEAR,QUARTER,INFCPI10YR`).
///
/// Quarterly dates become the quarter's first month (Q1 -> Jan, Q2 -> Apr,
/// Q3 -> Jul, Q4 -> Oct). Rows with an empty value cell are skipped, so the
/// series starts at the first reported observation.
pub fn load_inflation_expectations<P: AsRef<Path>>(path: P) -> Result<TimeSeries> {
    let file = File::open(&path)
        .with_context(|| format!("failed to open inflation file: {:?}", path.as_ref()))?;

    let mut reader = ReaderBuilder::new().from_reader(file);
    let mut points = Vec::new();
    for record in reader.deserialize() {
        let record: InflationRecord = record.context("failed to parse inflation row")?;
        let month = quarter_start_month(record.quarter).with_context(|| {
            format!("invalid quarter {} in year {}", record.quarter, record.year)
        })?;
        let date = NaiveDate::from_ymd_opt(record.year, month, 1)
            .with_context(|| format!("invalid date: year {} month {}", record.year, month))?;
        if let Some(value) = record.value {
            points.push((date, value));
        }
    }

    Ok(TimeSeries::new("INFCPI10YR", points)?)
}

/// Load the century-of-factor-premia monthly returns sheet.
///
/// The published sheet has `skip_rows` rows of preamble before the header
/// row; the header's first cell is the date column and every other cell
/// names a factor premium. Empty value cells become undefined panel cells.
pub fn load_factor_premia<P: AsRef<Path>>(path: P, skip_rows: usize) -> Result<Panel> {
    let file = File::open(&path)
        .with_context(|| format!("failed to open factor premia file: {:?}", path.as_ref()))?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut rows = reader.records();
    for _ in 0..skip_rows {
        if rows.next().is_none() {
            bail!("factor premia file ended inside the {skip_rows}-row preamble");
        }
    }

    let header = rows
        .next()
        .context("factor premia file has no header row after the preamble")??;
    if header.len() < 2 {
        bail!(
            "factor premia header has {} columns, need at least 2",
            header.len()
        );
    }
    let names: Vec<String> = header
        .iter()
        .skip(1)
        .map(|s| s.trim().to_string())
        .collect();

    let mut dates: Vec<NaiveDate> = Vec::new();
    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); names.len()];
    for record in rows {
        let record = record.context("failed to read factor premia row")?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let date_cell = record.get(0).unwrap_or("").trim();
        let date = NaiveDate::parse_from_str(date_cell, "%Y-%m-%d")
            .with_context(|| format!("invalid factor premia date: {date_cell:?}"))?;
        let date = super::series::month_start(date);
        if let Some(&last) = dates.last() {
            if date <= last {
                bail!("factor premia dates not strictly increasing at {date}");
            }
        }
        dates.push(date);

        for (j, column) in columns.iter_mut().enumerate() {
            let cell = record.get(j + 1).unwrap_or("").trim();
            if cell.is_empty() {
                column.push(None);
            } else {
                let value: f64 = cell.parse().with_context(|| {
                    format!("non-numeric value {cell:?} in column {}", names[j])
                })?;
                column.push(Some(value));
            }
        }
    }

    let mut panel = Panel::from_dates(dates);
    for (name, values) in names.into_iter().zip(columns) {
        panel = panel.with_column(name, values)?;
    }
    Ok(panel)
}

/// Write a series to CSV (`observation_date` plus the series name), for
/// charting outside the pipeline.
pub fn save_series_csv<P: AsRef<Path>>(series: &TimeSeries, path: P) -> Result<()> {
    let file = File::create(&path)
        .with_context(|| format!("failed to create file: {:?}", path.as_ref()))?;

    let mut writer = Writer::from_writer(file);
    writer.write_record(["observation_date", series.name()])?;
    for (date, value) in series.iter() {
        writer.write_record([date.to_string(), value.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_fed_funds() {
        let dir = tempdir().unwrap();
        let path = write_file(
            &dir,
            "fedfunds.csv",
            "observation_date,FEDFUNDS\n1991-10-01,5.21\n1991-11-01,4.81\n",
        );

        let series = load_fed_funds(&path).unwrap();
        assert_eq!(series.name(), "FEDFUNDS");
        assert_eq!(series.len(), 2);
        assert_eq!(series.values().next(), Some(5.21));
    }

    #[test]
    fn test_load_neutral_rate_renames_column() {
        let dir = tempdir().unwrap();
        let path = write_file(&dir, "r_star.csv", "Date,rstar\n1991-10-01,2.5\n");

        let series = load_neutral_rate(&path).unwrap();
        assert_eq!(series.name(), "RSTAR");
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_load_inflation_expectations_quarter_mapping() {
        let dir = tempdir().unwrap();
        let path = write_file(
            &dir,
            "spf.csv",
            "YEAR,QUARTER,INFCPI10YR\n1991,3,\n1991,4,3.95\n1992,1,3.9\n",
        );

        let series = load_inflation_expectations(&path).unwrap();
        // The empty 1991 Q3 cell is skipped.
        assert_eq!(series.len(), 2);
        let dates: Vec<_> = series.dates().collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(1991, 10, 1).unwrap(),
                NaiveDate::from_ymd_opt(1992, 1, 1).unwrap()
            ]
        );
    }

    #[test]
    fn test_load_inflation_rejects_bad_quarter() {
        let dir = tempdir().unwrap();
        let path = write_file(&dir, "spf.csv", "YEAR,QUARTER,INFCPI10YR\n1991,5,3.95\n");
        assert!(load_inflation_expectations(&path).is_err());
    }

    #[test]
    fn test_load_factor_premia_with_preamble() {
        let dir = tempdir().unwrap();
        let path = write_file(
            &dir,
            "premia.csv",
            ",,\n,notes,\nDate,US Value,US Momentum\n1991-10-31,0.01,-0.02\n1991-11-30,0.02,\n",
        );

        let panel = load_factor_premia(&path, 2).unwrap();
        assert_eq!(panel.n_rows(), 2);
        assert_eq!(
            panel.column_names(),
            &["US Value".to_string(), "US Momentum".to_string()]
        );
        // Dates are normalized to month start.
        assert_eq!(
            panel.dates()[0],
            NaiveDate::from_ymd_opt(1991, 10, 1).unwrap()
        );
        // The empty momentum cell is undefined, not zero.
        assert_eq!(panel.column("US Momentum").unwrap()[1], None);
    }

    #[test]
    fn test_save_series_csv_round_trip() {
        let dir = tempdir().unwrap();
        let series = TimeSeries::new(
            "MPSTANCE",
            vec![(NaiveDate::from_ymd_opt(1991, 10, 1).unwrap(), 1.5)],
        )
        .unwrap();

        let path = dir.path().join("stance.csv");
        save_series_csv(&series, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("observation_date,MPSTANCE"));
        assert!(contents.contains("1991-10-01,1.5"));
    }
}
