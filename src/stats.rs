use chrono::NaiveDate;
use serde::Serialize;

use crate::parser::RawTable;

/// Per-dataset data-quality summary. Rows dropped anywhere between the raw
/// CSV and the final series are accounted for here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeriesQuality {
    pub short_name: String,
    pub rows_read: usize,
    /// 1 when the first row was recognised as a header, else 0.
    pub header_rows: usize,

    // dropped rows, by reason
    pub malformed_rows: usize,
    pub invalid_dates: usize,
    pub invalid_values: usize,
    pub duplicate_dates: usize,

    pub observations: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl SeriesQuality {
    /// Starts a summary from the parser's counters.
    pub fn from_raw(short_name: &str, raw: &RawTable) -> Self {
        SeriesQuality {
            short_name: short_name.to_string(),
            rows_read: raw.rows_read,
            malformed_rows: raw.malformed_rows,
            ..Default::default()
        }
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    /// Rows that did not become an observation, for any reason.
    pub fn dropped(&self) -> usize {
        self.rows_read.saturating_sub(self.observations)
    }

    pub fn kept_pct(&self) -> f64 {
        Self::pct(self.observations, self.rows_read)
    }

    /// True when any data row was discarded. A recognised header is not a loss.
    pub fn has_losses(&self) -> bool {
        self.malformed_rows > 0
            || self.invalid_dates > 0
            || self.invalid_values > 0
            || self.duplicate_dates > 0
    }
}
