//! Export functionality for Roster run results.
//!
//! The returns table is written wide: a `Date` column followed by one column
//! per symbol, with an empty cell wherever a symbol has no value. Mappings,
//! matched rows, resolution errors and skipped symbols are written as plain
//! record lists.

use roster::{MatchedConstituent, ResolutionError, ReturnsTable, SkippedSymbol, SymbolMapping};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Comma-separated values format.
    #[default]
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" | "prettyjson" => Ok(Self::PrettyJson),
            _ => Err(ExportError::InvalidFormat(s.to_string())),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn finish_csv(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

/// Column names of a record list, written even when the list is empty.
trait CsvColumns {
    const COLUMNS: &'static [&'static str];
}

impl CsvColumns for SymbolMapping {
    const COLUMNS: &'static [&'static str] = &["company", "symbol"];
}

impl CsvColumns for ResolutionError {
    const COLUMNS: &'static [&'static str] = &["company", "reason"];
}

impl CsvColumns for MatchedConstituent {
    const COLUMNS: &'static [&'static str] = &["date", "company", "symbol"];
}

impl CsvColumns for SkippedSymbol {
    const COLUMNS: &'static [&'static str] = &["symbol", "reason"];
}

fn records_to_string<T: Serialize + CsvColumns>(
    records: &[T],
    format: ExportFormat,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => {
            let mut wtr = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(vec![]);
            wtr.write_record(T::COLUMNS)?;
            for record in records {
                wtr.serialize(record)?;
            }
            finish_csv(wtr)
        }
        ExportFormat::Json => Ok(serde_json::to_string(records)?),
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(records)?),
    }
}

/// Rows of the returns table as JSON objects keyed by column name.
fn returns_rows_json(table: &ReturnsTable) -> Value {
    let symbols = table.symbols();
    let rows = table
        .rows()
        .map(|(date, values)| {
            let mut row = Map::new();
            row.insert("Date".to_string(), Value::String(date.to_string()));
            for (symbol, value) in symbols.iter().zip(values) {
                row.insert((*symbol).to_string(), serde_json::json!(value));
            }
            Value::Object(row)
        })
        .collect();
    Value::Array(rows)
}

impl Exporter for ReturnsTable {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                let mut header = vec!["Date"];
                header.extend(self.symbols());
                wtr.write_record(&header)?;

                for (date, values) in self.rows() {
                    let mut record = Vec::with_capacity(values.len() + 1);
                    record.push(date.to_string());
                    record.extend(
                        values
                            .into_iter()
                            .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
                    );
                    wtr.write_record(&record)?;
                }
                finish_csv(wtr)
            }
            ExportFormat::Json => Ok(serde_json::to_string(&returns_rows_json(self))?),
            ExportFormat::PrettyJson => {
                Ok(serde_json::to_string_pretty(&returns_rows_json(self))?)
            }
        }
    }
}

impl Exporter for [SymbolMapping] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        records_to_string(self, format)
    }
}

impl Exporter for [ResolutionError] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        records_to_string(self, format)
    }
}

impl Exporter for [MatchedConstituent] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        records_to_string(self, format)
    }
}

impl Exporter for [SkippedSymbol] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        records_to_string(self, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use roster::data::DailyChange;
    use rstest::rstest;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, day).unwrap()
    }

    fn table() -> ReturnsTable {
        ReturnsTable::from_series(vec![
            (
                "BARC.L".to_string(),
                vec![DailyChange::new(d(1), 1.5), DailyChange::new(d(2), -0.25)],
            ),
            ("TSCO.L".to_string(), vec![DailyChange::new(d(2), 0.75)]),
        ])
    }

    #[test]
    fn test_returns_table_export_csv() {
        let csv = table().export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Date,BARC.L,TSCO.L");
        assert_eq!(lines[1], "2021-03-01,1.5,");
        assert_eq!(lines[2], "2021-03-02,-0.25,0.75");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_empty_returns_table_export_csv() {
        let csv = ReturnsTable::default()
            .export_to_string(ExportFormat::Csv)
            .unwrap();
        assert_eq!(csv.trim(), "Date");
    }

    #[test]
    fn test_returns_table_export_json() {
        let json = table().export_to_string(ExportFormat::Json).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["Date"], "2021-03-01");
        assert_eq!(value[0]["BARC.L"], 1.5);
        assert!(value[0]["TSCO.L"].is_null());
        assert_eq!(value[1]["TSCO.L"], 0.75);
    }

    #[test]
    fn test_returns_table_json_keeps_column_order() {
        let json = table().export_to_string(ExportFormat::Json).unwrap();
        assert!(json.starts_with(r#"[{"Date":"2021-03-01","BARC.L":1.5,"TSCO.L":null}"#));
    }

    #[test]
    fn test_returns_table_export_pretty_json() {
        let json = table().export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(json.contains("\"BARC.L\""));
        assert!(json.contains("  ")); // Indentation indicates pretty format
    }

    #[test]
    fn test_resolution_errors_export_csv() {
        let errors = vec![
            ResolutionError {
                company: "Old Mutual".to_string(),
                reason: "no match".to_string(),
            },
            ResolutionError {
                company: "Sky".to_string(),
                reason: "timed out".to_string(),
            },
        ];

        let csv = errors.export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "company,reason");
        assert_eq!(lines[1], "Old Mutual,no match");
        assert_eq!(lines[2], "Sky,timed out");
    }

    #[test]
    fn test_empty_lists_keep_header() {
        let errors: Vec<ResolutionError> = Vec::new();
        assert_eq!(
            errors.export_to_string(ExportFormat::Csv).unwrap(),
            "company,reason\n"
        );

        let skipped: Vec<SkippedSymbol> = Vec::new();
        assert_eq!(
            skipped.export_to_string(ExportFormat::Csv).unwrap(),
            "symbol,reason\n"
        );

        let matched: Vec<MatchedConstituent> = Vec::new();
        assert_eq!(
            matched.export_to_string(ExportFormat::Json).unwrap(),
            "[]"
        );
    }

    #[test]
    fn test_mappings_export_keeps_empty_symbol() {
        let mappings = vec![
            SymbolMapping::new("Barclays", "BARC.L"),
            SymbolMapping::unresolved("Sky"),
        ];

        let csv = mappings.export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.contains("Barclays,BARC.L"));
        assert!(csv.contains("Sky,\n"));
    }

    #[test]
    fn test_matched_constituents_export_json() {
        let matched = vec![MatchedConstituent {
            date: d(31),
            company: "Barclays".to_string(),
            symbol: "BARC.L".to_string(),
        }];

        let json = matched.export_to_string(ExportFormat::Json).unwrap();
        assert!(json.contains("\"2021-03-31\""));
        assert!(json.contains("\"BARC.L\""));
    }

    #[test]
    fn test_skipped_symbols_export() {
        let skipped = vec![SkippedSymbol {
            symbol: "DEAD.L".to_string(),
            reason: "delisted".to_string(),
        }];

        let csv = skipped.export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.contains("DEAD.L,delisted"));
    }

    #[test]
    fn test_export_to_file() {
        use std::io::Read;

        let path = std::env::temp_dir().join("roster_test_export_returns.csv");
        table().export_to_file(&path, ExportFormat::Csv).unwrap();

        let mut content = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert!(content.starts_with("Date,BARC.L,TSCO.L"));

        std::fs::remove_file(path).ok();
    }

    #[rstest]
    #[case(ExportFormat::Csv, "csv")]
    #[case(ExportFormat::Json, "json")]
    #[case(ExportFormat::PrettyJson, "json")]
    fn test_export_format_extension(#[case] format: ExportFormat, #[case] extension: &str) {
        assert_eq!(format.extension(), extension);
    }

    #[rstest]
    #[case("csv", ExportFormat::Csv)]
    #[case("JSON", ExportFormat::Json)]
    #[case("pretty-json", ExportFormat::PrettyJson)]
    fn test_export_format_from_str(#[case] input: &str, #[case] expected: ExportFormat) {
        assert_eq!(input.parse::<ExportFormat>().unwrap(), expected);
    }

    #[test]
    fn test_export_format_from_str_invalid() {
        assert!(matches!(
            "xml".parse::<ExportFormat>(),
            Err(ExportError::InvalidFormat(_))
        ));
    }
}
