//! Trailing-window sums for new-listings columns.

use crate::table::{Column, WideTable};

/// Columns with this prefix get a rolling sum.
pub const ROLLING_PREFIX: &str = "newlistings_";
pub const ROLLING_WINDOW: usize = 7;

/// Name of the derived column, e.g. `newlistings_us_7d`.
pub fn rolling_name(base: &str, window: usize) -> String {
    format!("{base}_{window}d")
}

/// Sum of each full `window` ending at every position.
///
/// Positions with fewer than `window` values so far, or with any missing value
/// inside the window, are missing.
pub fn rolling_sum(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            values[i + 1 - window..=i].iter().copied().sum::<Option<f64>>()
        })
        .collect()
}

/// Appends a rolling-sum column for every column whose name starts with
/// `prefix`, after all existing columns and in base-column order. Returns the
/// number of columns added.
pub fn append_rolling_sums(table: &mut WideTable, prefix: &str, window: usize) -> usize {
    let derived: Vec<Column> = table
        .columns()
        .iter()
        .filter(|c| c.name.starts_with(prefix))
        .map(|c| Column {
            name: rolling_name(&c.name, window),
            values: rolling_sum(&c.values, window),
        })
        .collect();

    let added = derived.len();
    for column in derived {
        table.push_column(column);
    }
    added
}
