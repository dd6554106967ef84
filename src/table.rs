//! Alignment of many series onto one contiguous daily axis.

use chrono::NaiveDate;

use crate::series::Series;

/// A named column of the wide table; `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// One row per calendar day, one column per dataset (plus derived columns).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl WideTable {
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Number of rows (dates).
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Appends a column after the existing ones.
    ///
    /// # Panics
    ///
    /// Panics if the column length differs from the number of rows.
    pub fn push_column(&mut self, column: Column) {
        assert_eq!(
            column.values.len(),
            self.dates.len(),
            "column '{}' does not match the date axis",
            column.name
        );
        self.columns.push(column);
    }
}

/// Every calendar day from `start` to `end`, inclusive.
pub fn daily_grid(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

/// Replaces each missing value with the closest earlier observed value.
/// Leading gaps stay missing.
pub fn forward_fill(values: &mut [Option<f64>]) {
    let mut last = None;
    for v in values.iter_mut() {
        match v {
            Some(x) => last = Some(*x),
            None => *v = last,
        }
    }
}

/// Merges `series` (in catalog order) onto a daily grid spanning all of them,
/// forward-filling gaps column by column.
pub fn merge(series: &[Series]) -> WideTable {
    let start = series.iter().filter_map(Series::first_date).min();
    let end = series.iter().filter_map(Series::last_date).max();

    let dates = match (start, end) {
        (Some(start), Some(end)) => daily_grid(start, end),
        _ => Vec::new(),
    };

    let mut table = WideTable {
        dates,
        columns: Vec::with_capacity(series.len()),
    };

    for s in series {
        let mut values: Vec<Option<f64>> = table.dates.iter().map(|d| s.get(*d)).collect();
        forward_fill(&mut values);
        table.push_column(Column {
            name: s.name().to_string(),
            values,
        });
    }

    table
}
