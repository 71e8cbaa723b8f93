//! Time series primitives
//!
//! A [`TimeSeries`] is a named sequence of (month, value) observations with
//! unique, strictly increasing dates. Dates are always normalized to the
//! first day of their month so that sources reported on different days of
//! the month can be joined on a common monthly grid.

use chrono::{Datelike, Months, NaiveDate};

use super::DataError;

/// Normalize a date to the first day of its month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .expect("first of month is always a valid date")
}

/// First month of a calendar quarter (1..=4), as a month number.
pub fn quarter_start_month(quarter: u32) -> Option<u32> {
    match quarter {
        1 => Some(1),
        2 => Some(4),
        3 => Some(7),
        4 => Some(10),
        _ => None,
    }
}

/// A named monthly time series with no missing values.
///
/// Missingness only appears at the panel level, as the result of joins;
/// a `TimeSeries` itself is always dense over its own observation dates.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    name: String,
    points: Vec<(NaiveDate, f64)>,
}

impl TimeSeries {
    /// Build a series from raw observations.
    ///
    /// Dates are normalized to month start, then the whole sequence is
    /// validated to be strictly increasing (duplicate months are rejected
    /// rather than silently collapsed).
    pub fn new(
        name: impl Into<String>,
        points: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Self, DataError> {
        let name = name.into();
        let points: Vec<(NaiveDate, f64)> = points
            .into_iter()
            .map(|(d, v)| (month_start(d), v))
            .collect();

        for pair in points.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(DataError::UnorderedDates {
                    series: name,
                    date: pair[1].0,
                });
            }
        }

        Ok(Self { name, points })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|(d, _)| *d)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(NaiveDate, f64)> {
        self.points.iter()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(d, _)| *d)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(d, _)| *d)
    }

    /// Last observed value at or before a month (forward-fill lookup).
    /// `None` if the month precedes the first observation.
    pub fn value_at_or_before(&self, date: NaiveDate) -> Option<f64> {
        let date = month_start(date);
        match self.points.binary_search_by_key(&date, |(d, _)| *d) {
            Ok(i) => Some(self.points[i].1),
            Err(0) => None,
            Err(i) => Some(self.points[i - 1].1),
        }
    }

    /// Drop all observations strictly before `date`.
    pub fn truncate_before(&self, date: NaiveDate) -> Self {
        let date = month_start(date);
        let points = self
            .points
            .iter()
            .filter(|(d, _)| *d >= date)
            .copied()
            .collect();
        Self {
            name: self.name.clone(),
            points,
        }
    }

    /// Expand a sparse (e.g. quarterly) series to a dense monthly series by
    /// carrying the last observed value forward, from the first observation
    /// through `end` (inclusive).
    pub fn forward_fill_monthly(&self, end: NaiveDate) -> Result<Self, DataError> {
        let start = self
            .first_date()
            .ok_or_else(|| DataError::EmptySeries(self.name.clone()))?;
        let end = month_start(end);

        let mut points = Vec::new();
        let mut current = start;
        while current <= end {
            // `start` is the first observation, so the lookup never misses.
            let value = self
                .value_at_or_before(current)
                .ok_or_else(|| DataError::EmptySeries(self.name.clone()))?;
            points.push((current, value));
            current = current
                .checked_add_months(Months::new(1))
                .ok_or_else(|| DataError::DateOverflow(current))?;
        }

        Ok(Self {
            name: self.name.clone(),
            points,
        })
    }
}
