//! Monthly panel: a date index with named columns
//!
//! A [`Panel`] is the unit passed between pipeline stages. Joins can leave
//! cells undefined (`None`); the bridge into the regression layer
//! ([`Panel::to_dataset`]) refuses to produce a design matrix while any
//! selected cell is undefined, so missing values never reach the numerical
//! routines.

use std::fmt::Write as _;

use chrono::NaiveDate;
use ndarray::{Array1, Array2};

use super::series::TimeSeries;
use super::DataError;

/// A monthly panel of named `Option<f64>` columns over a shared date index.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    dates: Vec<NaiveDate>,
    names: Vec<String>,
    /// Column-major storage: `values[c][r]`.
    values: Vec<Vec<Option<f64>>>,
}

impl Panel {
    /// Empty panel with a date index and no columns.
    pub fn from_dates(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            names: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Panel with a single series as both index and first column.
    pub fn from_series(series: &TimeSeries) -> Self {
        Self {
            dates: series.dates().collect(),
            names: vec![series.name().to_string()],
            values: vec![series.values().map(Some).collect()],
        }
    }

    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    fn column_index(&self, name: &str) -> Result<usize, DataError> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    /// Raw column including undefined cells.
    pub fn column(&self, name: &str) -> Result<&[Option<f64>], DataError> {
        let idx = self.column_index(name)?;
        Ok(&self.values[idx])
    }

    /// Dense column; fails if any cell is undefined.
    pub fn column_dense(&self, name: &str) -> Result<Vec<f64>, DataError> {
        let column = self.column(name)?;
        let missing = column.iter().filter(|v| v.is_none()).count();
        if missing > 0 {
            return Err(DataError::UndefinedCells {
                column: name.to_string(),
                count: missing,
            });
        }
        Ok(column.iter().map(|v| v.unwrap()).collect())
    }

    /// Append a column; its length must match the date index.
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<Self, DataError> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(DataError::DuplicateColumn(name));
        }
        if values.len() != self.dates.len() {
            return Err(DataError::LengthMismatch {
                column: name,
                expected: self.dates.len(),
                got: values.len(),
            });
        }
        self.names.push(name);
        self.values.push(values);
        Ok(self)
    }

    /// Left join a series onto this panel's date index with forward fill:
    /// each row takes the series' last value at or before the row's month,
    /// `None` before the series' first observation.
    pub fn left_join_ffill(self, series: &TimeSeries) -> Result<Self, DataError> {
        let values: Vec<Option<f64>> = self
            .dates
            .iter()
            .map(|&d| series.value_at_or_before(d))
            .collect();
        self.with_column(series.name().to_string(), values)
    }

    /// Inner join with another panel on the date index. Rows present in both
    /// panels survive; disjoint indices produce an empty panel.
    pub fn inner_join(&self, other: &Panel) -> Result<Panel, DataError> {
        for name in &other.names {
            if self.has_column(name) {
                return Err(DataError::DuplicateColumn(name.clone()));
            }
        }

        let mut dates = Vec::new();
        let mut left_rows = Vec::new();
        let mut right_rows = Vec::new();
        for (i, &d) in self.dates.iter().enumerate() {
            if let Ok(j) = other.dates.binary_search(&d) {
                dates.push(d);
                left_rows.push(i);
                right_rows.push(j);
            }
        }

        let mut values = Vec::with_capacity(self.n_cols() + other.n_cols());
        for col in &self.values {
            values.push(left_rows.iter().map(|&i| col[i]).collect());
        }
        for col in &other.values {
            values.push(right_rows.iter().map(|&j| col[j]).collect());
        }

        let mut names = self.names.clone();
        names.extend(other.names.iter().cloned());

        Ok(Panel {
            dates,
            names,
            values,
        })
    }

    /// Drop the first `n` rows of every column and the date index.
    pub fn drop_first_rows(&self, n: usize) -> Panel {
        let n = n.min(self.dates.len());
        Panel {
            dates: self.dates[n..].to_vec(),
            names: self.names.clone(),
            values: self
                .values
                .iter()
                .map(|col| col[n..].to_vec())
                .collect(),
        }
    }

    /// Dense design bridge for the regression layer.
    ///
    /// Fails fast if the target or any feature column has undefined cells,
    /// rather than letting NaN propagate into a solver.
    pub fn to_dataset(&self, target: &str, features: &[String]) -> Result<Dataset, DataError> {
        let y = Array1::from_vec(self.column_dense(target)?);

        let n = self.n_rows();
        let mut x = Array2::zeros((n, features.len()));
        for (j, name) in features.iter().enumerate() {
            let column = self.column_dense(name)?;
            for (i, v) in column.into_iter().enumerate() {
                x[[i, j]] = v;
            }
        }

        Ok(Dataset {
            x,
            y,
            feature_names: features.to_vec(),
            dates: self.dates.clone(),
        })
    }

    /// Descriptive statistics per column, skipping undefined cells.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<36} {:>6} {:>10} {:>10} {:>10} {:>10}",
            "column", "count", "mean", "std", "min", "max"
        );
        for (name, col) in self.names.iter().zip(self.values.iter()) {
            let defined: Vec<f64> = col.iter().flatten().copied().collect();
            if defined.is_empty() {
                let _ = writeln!(out, "{:<36} {:>6}", name, 0);
                continue;
            }
            let n = defined.len() as f64;
            let mean = defined.iter().sum::<f64>() / n;
            let var = defined.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let min = defined.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = defined.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let _ = writeln!(
                out,
                "{:<36} {:>6} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
                name,
                defined.len(),
                mean,
                var.sqrt(),
                min,
                max
            );
        }
        out
    }
}

/// Dense regression dataset derived from a [`Panel`].
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Feature matrix (n_samples x n_features)
    pub x: Array2<f64>,
    /// Target vector (n_samples)
    pub y: Array1<f64>,
    /// Feature names
    pub feature_names: Vec<String>,
    /// Month for each sample
    pub dates: Vec<NaiveDate>,
}

impl Dataset {
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }
}
