//! In-memory tabular dataset

use super::value::{ColumnType, Value};
use crate::error::{CleanError, OptionExt, Result};
use std::collections::HashSet;
use std::ops::Range;

/// Rows of typed cells under a fixed header.
///
/// Every row holds exactly `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Build a dataset, padding short rows with nulls.
    ///
    /// Fails on empty or duplicate header names and on rows wider than the
    /// header.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for name in &headers {
            if name.trim().is_empty() {
                return Err(CleanError::invalid_input("column names cannot be empty"));
            }
            if !seen.insert(name.as_str()) {
                return Err(CleanError::DuplicateHeader { name: name.clone() });
            }
        }

        let width = headers.len();
        let mut dataset = Dataset {
            headers,
            rows: Vec::with_capacity(rows.len()),
        };
        for (i, row) in rows.into_iter().enumerate() {
            // +2: one for the header line, one for 1-based numbering
            dataset.push_row(row, i as u64 + 2)?;
            debug_assert!(dataset.rows.last().map_or(true, |r| r.len() == width));
        }
        Ok(dataset)
    }

    /// Build a dataset from raw string records, parsing every field
    pub fn from_strings<S: AsRef<str>>(headers: &[S], rows: &[Vec<S>]) -> Result<Self> {
        Self::new(
            headers.iter().map(|h| h.as_ref().to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| Value::parse(c.as_ref())).collect())
                .collect(),
        )
    }

    pub(crate) fn push_row(&mut self, mut row: Vec<Value>, line: u64) -> Result<()> {
        let width = self.headers.len();
        if row.len() > width {
            return Err(CleanError::RaggedRow {
                line,
                expected: width,
                found: row.len(),
            });
        }
        row.resize(width, Value::Null);
        self.rows.push(row);
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Like [`column_index`](Self::column_index) but fails with `UnknownColumn`
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name).ok_or_unknown_column(name)
    }

    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    pub fn column_type(&self, idx: usize) -> ColumnType {
        ColumnType::infer(self.column(idx))
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: Value) {
        self.rows[row][col] = value;
    }

    /// Apply `f` to every cell of a column
    pub fn map_column(&mut self, idx: usize, mut f: impl FnMut(&mut Value)) {
        for row in &mut self.rows {
            f(&mut row[idx]);
        }
    }

    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[Value]) -> bool) {
        self.rows.retain(|row| keep(row));
    }

    /// Total number of null cells
    pub fn missing_count(&self) -> usize {
        self.rows.iter().flatten().filter(|v| v.is_null()).count()
    }

    /// Copy of a contiguous range of rows; the range is clamped to the data
    pub fn slice(&self, range: Range<usize>) -> Dataset {
        let end = range.end.min(self.rows.len());
        let start = range.start.min(end);
        Dataset {
            headers: self.headers.clone(),
            rows: self.rows[start..end].to_vec(),
        }
    }

    /// Render as an aligned text table, one line per row prefixed with its
    /// index (`offset + i`). Nulls are shown as `NaN`.
    pub fn to_text_table(&self, offset: usize) -> String {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| match v {
                        Value::Null => "NaN".to_string(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect();

        let index_width = self
            .rows
            .len()
            .checked_sub(1)
            .map(|last| (offset + last).to_string().len())
            .unwrap_or(0);

        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(c, h)| {
                cells
                    .iter()
                    .map(|row| row[c].chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        out.push_str(&" ".repeat(index_width));
        for (h, w) in self.headers.iter().zip(&widths) {
            out.push_str(&format!("  {:>w$}", h, w = *w));
        }
        for (i, row) in cells.iter().enumerate() {
            out.push('\n');
            out.push_str(&format!("{:<w$}", offset + i, w = index_width));
            for (cell, w) in row.iter().zip(&widths) {
                out.push_str(&format!("  {:>w$}", cell, w = *w));
            }
        }
        out
    }
}
