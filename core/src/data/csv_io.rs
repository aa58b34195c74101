//! CSV reading and writing

use super::table::Dataset;
use super::value::Value;
use crate::error::{CleanError, Result};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

/// Options controlling how CSV files are parsed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Field delimiter (single ASCII character)
    pub delimiter: char,
    /// Whether the first record is a header row
    pub has_headers: bool,
    /// Trim surrounding whitespace from header names
    pub trim_headers: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_headers: true,
            trim_headers: true,
        }
    }
}

impl CsvOptions {
    fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(CleanError::invalid_config(format!(
                "CSV delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            )))
        }
    }
}

/// Read a CSV file into a dataset
pub fn read_csv(path: impl AsRef<Path>, options: &CsvOptions) -> Result<Dataset> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CleanError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = std::fs::File::open(path)?;
    let dataset = read_csv_from(file, options)?;
    log::info!(
        "Loaded {} rows x {} columns from {}",
        dataset.len(),
        dataset.width(),
        path.display()
    );
    Ok(dataset)
}

/// Read CSV data from any reader
pub fn read_csv_from<R: Read>(reader: R, options: &CsvOptions) -> Result<Dataset> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter_byte()?)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = csv_reader.records();

    let first = match records.next() {
        Some(record) => record?,
        None => {
            return Err(CleanError::EmptyDataset {
                reason: "no header row".to_string(),
            })
        }
    };

    let (headers, pending) = if options.has_headers {
        let headers = first
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let name = if options.trim_headers { h.trim() } else { h };
                if name.trim().is_empty() {
                    format!("column_{}", i)
                } else {
                    name.to_string()
                }
            })
            .collect();
        (headers, None)
    } else {
        let headers = (0..first.len()).map(|i| format!("column_{}", i)).collect();
        (headers, Some(first))
    };

    let mut dataset = Dataset::new(headers, Vec::new())?;

    for record in pending.into_iter().map(Ok).chain(records) {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let row = record.iter().map(Value::parse).collect();
        dataset.push_row(row, line)?;
    }

    Ok(dataset)
}

/// Write a dataset to a CSV file
pub fn write_csv(path: impl AsRef<Path>, dataset: &Dataset, options: &CsvOptions) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    write_csv_to(file, dataset, options)?;
    log::info!("Wrote {} rows to {}", dataset.len(), path.display());
    Ok(())
}

/// Write a dataset to any writer. Nulls are written as empty fields.
pub fn write_csv_to<W: Write>(writer: W, dataset: &Dataset, options: &CsvOptions) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter_byte()?)
        .from_writer(writer);

    csv_writer.write_record(dataset.headers())?;
    for row in dataset.rows() {
        csv_writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_with_headers() {
        let data = "name, age ,city\nAlice,30,Paris\nBob,NA,\n";
        let ds = read_csv_from(data.as_bytes(), &CsvOptions::default()).unwrap();
        assert_eq!(ds.headers(), ["name", "age", "city"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.cell(0, 1), Some(&Value::Int(30)));
        assert_eq!(ds.cell(1, 1), Some(&Value::Null));
        assert_eq!(ds.cell(1, 2), Some(&Value::Null));
    }

    #[test]
    fn test_read_without_headers() {
        let options = CsvOptions {
            has_headers: false,
            ..Default::default()
        };
        let ds = read_csv_from("1,2\n3,4\n".as_bytes(), &options).unwrap();
        assert_eq!(ds.headers(), ["column_0", "column_1"]);
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn test_custom_delimiter() {
        let options = CsvOptions {
            delimiter: ';',
            ..Default::default()
        };
        let ds = read_csv_from("a;b\n1;x\n".as_bytes(), &options).unwrap();
        assert_eq!(ds.cell(0, 1), Some(&Value::Text("x".to_string())));
    }

    #[test]
    fn test_blank_header_gets_positional_name() {
        let ds = read_csv_from("id,\n1,2\n".as_bytes(), &CsvOptions::default()).unwrap();
        assert_eq!(ds.headers(), ["id", "column_1"]);
    }

    #[test]
    fn test_empty_input() {
        let err = read_csv_from("".as_bytes(), &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, CleanError::EmptyDataset { .. }));
    }

    #[test]
    fn test_ragged_row_reports_line() {
        let err = read_csv_from("a,b\n1,2\n1,2,3\n".as_bytes(), &CsvOptions::default())
            .unwrap_err();
        assert!(matches!(err, CleanError::RaggedRow { line: 3, .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = read_csv("/definitely/not/here.csv", &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, CleanError::FileNotFound { .. }));
    }

    #[test]
    fn test_write_nulls_as_empty_fields() {
        let ds = Dataset::from_strings(&["a", "b"], &[vec!["1", "N/A"], vec!["x y", "2.5"]])
            .unwrap();
        let mut out = Vec::new();
        write_csv_to(&mut out, &ds, &CsvOptions::default()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a,b\n1,\nx y,2.5\n");
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("clean.csv");
        let ds = Dataset::from_strings(&["id", "ok"], &[vec!["1", "true"]]).unwrap();
        write_csv(&path, &ds, &CsvOptions::default()).unwrap();
        let back = read_csv(&path, &CsvOptions::default()).unwrap();
        assert_eq!(back, ds);
    }
}
