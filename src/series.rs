//! Normalization of a raw table into a clean date-indexed series.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::parser::RawTable;
use crate::stats::SeriesQuality;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Daily observations for one dataset, keyed by date in ascending order.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: String,
    points: BTreeMap<NaiveDate, f64>,
}

impl Series {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: BTreeMap::new(),
        }
    }

    /// Builds a series from `(date, value)` pairs; later pairs win on repeated dates.
    pub fn from_points(
        name: impl Into<String>,
        points: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Self {
        Self {
            name: name.into(),
            points: points.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts an observation, returning the value it replaced.
    pub fn insert(&mut self, date: NaiveDate, value: f64) -> Option<f64> {
        self.points.insert(date, value)
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.keys().next_back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.points.iter().map(|(d, v)| (*d, *v))
    }
}

/// A cleaned series and the record of what was discarded to produce it.
#[derive(Debug, Clone)]
pub struct NormalizedSeries {
    pub series: Series,
    pub quality: SeriesQuality,
}

/// Parses a date cell with the fixed `YYYY-MM-DD` pattern.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Parses a value cell after removing thousands separators.
pub fn parse_value(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    let v = cleaned.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Converts the raw date/value cells into a [`Series`] named `short_name`.
///
/// Rows with an unparseable date or value are dropped. A first row whose date
/// and value both fail to parse is taken as a header and counted separately.
/// A repeated date keeps the value that appears last in the file. An empty
/// result is valid.
pub fn normalize(raw: &RawTable, short_name: &str) -> NormalizedSeries {
    let mut quality = SeriesQuality::from_raw(short_name, raw);
    let mut series = Series::new(short_name);

    for (idx, row) in raw.rows.iter().enumerate() {
        let Some(date) = parse_date(&row.date) else {
            // a leading row with no parseable cells is a header
            if idx == 0 && parse_value(&row.value).is_none() {
                quality.header_rows = 1;
            } else {
                quality.invalid_dates += 1;
            }
            continue;
        };
        let Some(value) = parse_value(&row.value) else {
            quality.invalid_values += 1;
            continue;
        };
        if series.insert(date, value).is_some() {
            quality.duplicate_dates += 1;
        }
    }

    quality.observations = series.len();
    quality.first_date = series.first_date();
    quality.last_date = series.last_date();

    NormalizedSeries { series, quality }
}
