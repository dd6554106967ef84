//! Output formatting and persistence.
//!
//! The wide table is written as a JSON array of per-date records for the
//! charting front end; per-dataset quality summaries can be written as CSV.

use std::fs;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use serde::Serialize;
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use tracing::{debug, info};

use crate::catalog::DATE_FIELD;
use crate::error::{EtlError, Result};
use crate::series::DATE_FORMAT;
use crate::stats::SeriesQuality;
use crate::table::WideTable;

/// Serializes a [`WideTable`] as `[{"date": "...", "<column>": n | null, ...}, ...]`
/// with fields in column order.
pub struct Records<'a>(pub &'a WideTable);

struct Record<'a> {
    table: &'a WideTable,
    row: usize,
}

impl Serialize for Records<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for row in 0..self.0.len() {
            seq.serialize_element(&Record { table: self.0, row })?;
        }
        seq.end()
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let columns = self.table.columns();
        let mut map = serializer.serialize_map(Some(columns.len() + 1))?;
        let date = self.table.dates()[self.row].format(DATE_FORMAT).to_string();
        map.serialize_entry(DATE_FIELD, &date)?;
        for column in columns {
            map.serialize_entry(&column.name, &column.values[self.row])?;
        }
        map.end()
    }
}

/// Renders the table as compact JSON bytes.
pub fn to_json_bytes(table: &WideTable) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&Records(table))?)
}

/// Writes the table to `path`, replacing any previous file.
///
/// Parent directories are created as needed. The bytes are written to a
/// sibling temporary file first and renamed into place, so an interrupted
/// write never leaves a truncated output behind.
pub fn write_json(path: &Path, table: &WideTable) -> Result<()> {
    let bytes = to_json_bytes(table)?;
    write_replacing(path, &bytes)?;
    info!(path = %path.display(), rows = table.len(), columns = table.columns().len(), "Wrote table JSON");
    Ok(())
}

/// Writes one CSV row per dataset, header included, replacing any previous file.
pub fn write_quality_csv(path: &Path, rows: &[SeriesQuality]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| EtlError::io(path, e.into_error()))?;

    write_replacing(path, &bytes)?;
    debug!(path = %path.display(), datasets = rows.len(), "Wrote quality report");
    Ok(())
}

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_replacing(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| EtlError::io(parent, e))?;
    }

    let tmp = temp_sibling(path);
    fs::write(&tmp, bytes).map_err(|e| EtlError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        EtlError::io(path, e)
    })
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
