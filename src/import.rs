//! Biometric history import
//!
//! Reads daily records from CSV (flexible column names, blank cells mean
//! "not logged") or from a JSON array of records.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::cycles::parse_wake_time;
use crate::error::{ImportError, Result, RhythmError};
use crate::models::BiometricRecord;

/// Supported history file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Csv,
    Json,
}

impl ImportFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(ImportFormat::Csv),
            "json" => Ok(ImportFormat::Json),
            other => Err(ImportError::UnsupportedFormat {
                format: other.to_string(),
            }
            .into()),
        }
    }
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// CSV importer with flexible column mapping
pub struct CsvImporter {
    column_mapping: HashMap<String, &'static str>,
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        Self::add_mapping(&mut column_mapping, "date", &["date", "day"]);
        Self::add_mapping(&mut column_mapping, "wake_time", &["wake_time", "wake", "woke_at"]);
        Self::add_mapping(&mut column_mapping, "hrv", &["hrv", "rmssd", "hrv_ms"]);
        Self::add_mapping(
            &mut column_mapping,
            "resting_heart_rate",
            &["resting_heart_rate", "rhr", "resting_hr"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "sleep_duration_hours",
            &["sleep_duration_hours", "sleep", "sleep_hours", "sleep_duration"],
        );
        Self::add_mapping(&mut column_mapping, "mood", &["mood"]);

        Self { column_mapping }
    }

    fn add_mapping(
        mapping: &mut HashMap<String, &'static str>,
        standard: &'static str,
        variations: &[&str],
    ) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard);
        }
    }

    fn normalize_column_name(&self, name: &str) -> Option<&'static str> {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");
        self.column_mapping.get(&normalized).copied()
    }

    fn parse_date(raw: &str, row: usize) -> Result<NaiveDate> {
        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
            .ok_or_else(|| parse_error(row, format!("unrecognised date '{}'", raw)))
    }

    fn parse_number(raw: &str, column: &str, row: usize) -> Result<Option<f64>> {
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<f64>()
            .map(Some)
            .map_err(|_| parse_error(row, format!("{} is not a number: '{}'", column, raw)))
    }

    /// Parse CSV content into records
    pub fn parse<R: Read>(&self, reader: R) -> Result<Vec<BiometricRecord>> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| parse_error(1, e.to_string()))?
            .clone();

        let columns: HashMap<&'static str, usize> = headers
            .iter()
            .enumerate()
            .filter_map(|(i, name)| self.normalize_column_name(name).map(|standard| (standard, i)))
            .collect();

        if !columns.contains_key("date") {
            return Err(ImportError::MissingColumn {
                column: "date".to_string(),
            }
            .into());
        }

        let mut records = Vec::new();
        for (index, row) in csv_reader.records().enumerate() {
            // header is line 1
            let line = index + 2;
            let row = row.map_err(|e| parse_error(line, e.to_string()))?;
            records.push(self.parse_row(&row, &columns, line)?);
        }

        tracing::info!(records = records.len(), "Imported biometric history from CSV");
        Ok(records)
    }

    fn parse_row(
        &self,
        row: &StringRecord,
        columns: &HashMap<&'static str, usize>,
        line: usize,
    ) -> Result<BiometricRecord> {
        let cell = |name: &str| cell(row, columns, name);

        let mut record = BiometricRecord::new(Self::parse_date(cell("date"), line)?);

        let wake = cell("wake_time");
        if !wake.is_empty() {
            record.wake_time = Some(
                parse_wake_time(wake).map_err(|e| parse_error(line, e.to_string()))?,
            );
        }

        record.hrv = Self::parse_number(cell("hrv"), "hrv", line)?;
        record.resting_heart_rate =
            Self::parse_number(cell("resting_heart_rate"), "resting_heart_rate", line)?;
        record.sleep_duration_hours =
            Self::parse_number(cell("sleep_duration_hours"), "sleep_duration_hours", line)?;

        let mood = cell("mood");
        if !mood.is_empty() {
            record.mood = Some(mood.to_string());
        }

        Ok(record)
    }
}

fn cell<'a>(row: &'a StringRecord, columns: &HashMap<&'static str, usize>, name: &str) -> &'a str {
    columns
        .get(name)
        .and_then(|i| row.get(*i))
        .unwrap_or("")
}

fn parse_error(line: usize, reason: String) -> RhythmError {
    ImportError::ParseError {
        format: "csv".to_string(),
        location: format!("line {}", line),
        reason,
    }
    .into()
}

/// Parse a JSON array of records
pub fn parse_json(content: &str) -> Result<Vec<BiometricRecord>> {
    serde_json::from_str(content).map_err(|e| {
        RhythmError::from(ImportError::ParseError {
            format: "json".to_string(),
            location: format!("line {}, column {}", e.line(), e.column()),
            reason: e.to_string(),
        })
    })
}

/// Load history from a file, choosing the parser by extension
///
/// Records are returned newest first.
pub fn load_history(path: &Path) -> Result<Vec<BiometricRecord>> {
    let format = ImportFormat::from_path(path)?;
    let mut file = File::open(path).map_err(|e| ImportError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut records = match format {
        ImportFormat::Csv => CsvImporter::new().parse(file)?,
        ImportFormat::Json => {
            let mut content = String::new();
            file.read_to_string(&mut content)?;
            parse_json(&content)?
        }
    };

    records.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_csv_with_aliases_and_blanks() {
        let csv = "\
Date,Wake,RMSSD,Resting HR,Sleep Hours,Mood
2024-06-18,06:45,64.5,53,7.2,🙂
2024-06-19,06:30:00,,55,,😴
";
        let records = CsvImporter::new().parse(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 6, 18).unwrap());
        assert_eq!(first.wake_time, NaiveTime::from_hms_opt(6, 45, 0));
        assert_eq!(first.hrv, Some(64.5));
        assert_eq!(first.resting_heart_rate, Some(53.0));
        assert_eq!(first.sleep_duration_hours, Some(7.2));

        let second = &records[1];
        assert_eq!(second.hrv, None);
        assert_eq!(second.sleep_duration_hours, None);
        assert_eq!(second.mood.as_deref(), Some("😴"));
    }

    #[test]
    fn test_csv_missing_date_column() {
        let err = CsvImporter::new().parse("hrv\n60\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RhythmError::Import(ImportError::MissingColumn { .. })));
    }

    #[test]
    fn test_csv_bad_values_report_line() {
        let err = CsvImporter::new()
            .parse("date,hrv\n2024-06-18,60\n2024-06-19,high\n".as_bytes())
            .unwrap_err();
        assert!(err.to_string().contains("line 3"));

        let err = CsvImporter::new()
            .parse("date,wake\n2024-06-18,25:00\n".as_bytes())
            .unwrap_err();
        assert!(err.to_string().contains("Invalid time format"));
    }

    #[test]
    fn test_json_import() {
        let json = r#"[{"date":"2024-06-18","hrv":61.0},{"date":"2024-06-19","wake_time":"07:00"}]"#;
        let records = parse_json(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].wake_time, NaiveTime::from_hms_opt(7, 0, 0));

        assert!(parse_json("{").is_err());
    }

    #[test]
    fn test_load_history_sorts_newest_first() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "date,hrv").unwrap();
        writeln!(file, "2024-06-17,60").unwrap();
        writeln!(file, "2024-06-19,62").unwrap();
        writeln!(file, "2024-06-18,61").unwrap();

        let records = load_history(file.path()).unwrap();
        let hrv: Vec<Option<f64>> = records.iter().map(|r| r.hrv).collect();
        assert_eq!(hrv, vec![Some(62.0), Some(61.0), Some(60.0)]);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ImportFormat::from_path(Path::new("history.xlsx")).unwrap_err();
        assert!(matches!(err, RhythmError::Import(ImportError::UnsupportedFormat { .. })));
    }
}
