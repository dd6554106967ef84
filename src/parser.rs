//! Tolerant CSV tokenizer.
//!
//! Publisher CSVs occasionally contain short or over-long lines. Those rows
//! are dropped and counted rather than failing the whole dataset.

use csv::ReaderBuilder;

/// Raw cells of one accepted row: only the declared date and value columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub date: String,
    pub value: String,
}

/// Tokenized CSV with parse-quality counters.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub rows: Vec<RawRow>,
    /// Cell count of the first record; every accepted row has exactly this many.
    pub column_count: usize,
    /// Records seen, accepted or not.
    pub rows_read: usize,
    /// Records dropped for a mismatched cell count or undecodable content.
    pub malformed_rows: usize,
}

/// Tokenizes `text`, keeping the cells at `date_column` and `value_column`.
///
/// The first record (usually a header) fixes the expected column count and is
/// kept like any other row. If a declared column lies beyond that count the
/// corresponding cell is empty.
pub fn parse_rows(text: &str, date_column: usize, value_column: usize) -> RawTable {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut table = RawTable::default();
    let mut expected: Option<usize> = None;

    for result in reader.records() {
        table.rows_read += 1;

        let record = match result {
            Ok(record) => record,
            Err(_) => {
                table.malformed_rows += 1;
                continue;
            }
        };

        let width = *expected.get_or_insert(record.len());
        if record.len() != width {
            table.malformed_rows += 1;
            continue;
        }

        let cell = |idx: usize| record.get(idx).unwrap_or("").to_string();
        table.rows.push(RawRow {
            date: cell(date_column),
            value: cell(value_column),
        });
    }

    table.column_count = expected.unwrap_or(0);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_text() {
        let table = parse_rows("", 0, 1);
        assert!(table.rows.is_empty());
        assert_eq!(table.column_count, 0);
        assert_eq!(table.rows_read, 0);
    }

    #[test]
    fn test_parse_keeps_only_declared_columns() {
        let table = parse_rows("period,value,region\n2024-01-01,5,US\n", 0, 1);

        assert_eq!(table.column_count, 3);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(
            table.rows[1],
            RawRow {
                date: "2024-01-01".to_string(),
                value: "5".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_drops_short_and_long_rows() {
        let text = "date,value\n2024-01-01,1\n2024-01-02\n2024-01-03,3\n2024-01-04,4,extra\n";
        let table = parse_rows(text, 0, 1);

        assert_eq!(table.rows_read, 5);
        assert_eq!(table.malformed_rows, 2);
        let dates: Vec<_> = table.rows.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, ["date", "2024-01-01", "2024-01-03"]);
    }

    #[test]
    fn test_parse_quoted_fields_with_commas() {
        let text = "date,value\n2024-01-01,\"1,234\"\n\"2024-01-02\",\"5,678.5\"\n";
        let table = parse_rows(text, 0, 1);

        assert_eq!(table.malformed_rows, 0);
        assert_eq!(table.rows[1].value, "1,234");
        assert_eq!(table.rows[2].date, "2024-01-02");
        assert_eq!(table.rows[2].value, "5,678.5");
    }

    #[test]
    fn test_parse_declared_value_column() {
        let table = parse_rows("PeriodBegin,Region,Value\n2024-01-01,US,42\n", 0, 2);
        assert_eq!(table.rows[1].value, "42");
    }

    #[test]
    fn test_parse_value_column_beyond_width_is_empty() {
        let table = parse_rows("2024-01-01\n2024-01-02\n", 0, 1);
        assert_eq!(table.rows.len(), 2);
        assert!(table.rows.iter().all(|r| r.value.is_empty()));
    }
}
