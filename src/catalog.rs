//! Dataset catalog: which CSVs to pull and how to read them.
//!
//! Stored as JSON on disk:
//! ```json
//! {
//!   "datasets": [
//!     { "short_name": "newlistings_us", "csv_url": "https://.../new_listings.csv" },
//!     { "short_name": "price_us", "csv_url": "https://.../price.csv", "value_column": 2 }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{EtlError, Result};
use crate::rolling::{ROLLING_PREFIX, ROLLING_WINDOW, rolling_name};

/// One dataset to fetch. `short_name` becomes the output column key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatasetDescriptor {
    pub short_name: String,
    pub csv_url: String,
    /// Zero-based position of the date column.
    #[serde(default)]
    pub date_column: usize,
    /// Zero-based position of the value column.
    #[serde(default = "default_value_column")]
    pub value_column: usize,
}

/// Output field holding the row's date; no dataset may use it as a name.
pub const DATE_FIELD: &str = "date";

fn default_value_column() -> usize {
    1
}

impl DatasetDescriptor {
    /// Descriptor using the default layout (date in column 0, value in column 1).
    pub fn new(short_name: impl Into<String>, csv_url: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            csv_url: csv_url.into(),
            date_column: 0,
            value_column: default_value_column(),
        }
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    datasets: Vec<DatasetDescriptor>,
}

/// Ordered list of datasets. Order determines output column order.
#[derive(Debug, Clone)]
pub struct Catalog {
    datasets: Vec<DatasetDescriptor>,
}

impl Catalog {
    /// Loads and validates the catalog at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| EtlError::catalog(path, e.to_string()))?;
        let catalog = Self::from_json(&content).map_err(|reason| EtlError::catalog(path, reason))?;
        debug!(path = %path.display(), datasets = catalog.len(), "Catalog loaded");
        Ok(catalog)
    }

    /// Parses catalog JSON, returning a human-readable reason on failure.
    pub fn from_json(content: &str) -> std::result::Result<Self, String> {
        let file: CatalogFile = serde_json::from_str(content).map_err(|e| e.to_string())?;

        let mut seen = HashSet::new();
        for ds in &file.datasets {
            if ds.short_name.trim().is_empty() {
                return Err(format!("dataset with URL '{}' has an empty short_name", ds.csv_url));
            }
            if ds.short_name == DATE_FIELD {
                return Err(format!("short_name '{DATE_FIELD}' is reserved for the date axis"));
            }
            if !seen.insert(ds.short_name.as_str()) {
                return Err(format!("duplicate short_name '{}'", ds.short_name));
            }
            if ds.date_column == ds.value_column {
                return Err(format!(
                    "dataset '{}' uses column {} for both date and value",
                    ds.short_name, ds.date_column
                ));
            }
        }

        // derived rolling columns share the output namespace
        for ds in &file.datasets {
            if !ds.short_name.starts_with(ROLLING_PREFIX) {
                continue;
            }
            let derived = rolling_name(&ds.short_name, ROLLING_WINDOW);
            if seen.contains(derived.as_str()) {
                return Err(format!(
                    "short_name '{derived}' clashes with the rolling column derived from '{}'",
                    ds.short_name
                ));
            }
        }

        Ok(Self {
            datasets: file.datasets,
        })
    }

    pub fn datasets(&self) -> &[DatasetDescriptor] {
        &self.datasets
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}
