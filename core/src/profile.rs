//! Column profiling: null counts, distinct values and descriptive statistics

use crate::data::{ColumnType, Dataset, Value};
use crate::stats;
use serde::Serialize;
use std::collections::HashSet;

const SAMPLE_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub standard_deviation: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub column_type: ColumnType,
    pub null_count: usize,
    pub non_null_count: usize,
    /// Share of non-null cells; 0 for a dataset without rows
    pub non_null_proportion: f64,
    pub distinct_count: usize,
    /// First few distinct values in row order
    pub sample_values: Vec<Value>,
    /// Present for numeric columns with at least one value
    pub stats: Option<DescriptiveStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetProfile {
    pub row_count: usize,
    pub columns: Vec<ColumnProfile>,
}

impl DatasetProfile {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }
}

pub fn profile(dataset: &Dataset) -> DatasetProfile {
    let columns = dataset
        .headers()
        .iter()
        .enumerate()
        .map(|(idx, name)| profile_column(dataset, idx, name))
        .collect();

    DatasetProfile {
        row_count: dataset.len(),
        columns,
    }
}

fn profile_column(dataset: &Dataset, idx: usize, name: &str) -> ColumnProfile {
    let row_count = dataset.len();
    let column_type = dataset.column_type(idx);

    let mut seen = HashSet::new();
    let mut sample_values = Vec::new();
    let mut non_null_count = 0;
    for value in dataset.column(idx).filter(|v| !v.is_null()) {
        non_null_count += 1;
        if seen.insert(value.key()) && sample_values.len() < SAMPLE_SIZE {
            sample_values.push(value.clone());
        }
    }

    let stats = if column_type.is_numeric() {
        let numbers: Vec<f64> = dataset.column(idx).filter_map(Value::as_f64).collect();
        describe(&numbers)
    } else {
        None
    };

    ColumnProfile {
        name: name.to_string(),
        column_type,
        null_count: row_count - non_null_count,
        non_null_count,
        non_null_proportion: if row_count > 0 {
            non_null_count as f64 / row_count as f64
        } else {
            0.0
        },
        distinct_count: seen.len(),
        sample_values,
        stats,
    }
}

fn describe(numbers: &[f64]) -> Option<DescriptiveStats> {
    Some(DescriptiveStats {
        min: stats::min(numbers)?,
        max: stats::max(numbers)?,
        mean: stats::mean(numbers)?,
        median: stats::median(numbers)?,
        standard_deviation: stats::std_dev(numbers)?,
    })
}
