//! Declarative expectations checked against a dataset
//!
//! Expectations are loaded from the `[[expectations]]` tables of the config
//! file. A failed expectation is a result, not an error; only malformed
//! expectations (such as an invalid regex) abort validation.

use crate::data::{Dataset, Value, ValueKey};
use crate::error::{CleanError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

const UNEXPECTED_SAMPLE: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expectation {
    /// The dataset's columns equal (or, without `exact_match`, contain) the set
    ColumnsMatchSet {
        columns: Vec<String>,
        #[serde(default = "default_true")]
        exact_match: bool,
    },
    ColumnValuesNotNull {
        column: String,
    },
    /// Inclusive numeric bounds; either side may be omitted
    ColumnValuesBetween {
        column: String,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    ColumnValuesInSet {
        column: String,
        values: Vec<String>,
    },
    ColumnValuesMatchRegex {
        column: String,
        regex: String,
    },
    ColumnValuesUnique {
        column: String,
    },
}

fn default_true() -> bool {
    true
}

impl Expectation {
    pub fn column(&self) -> Option<&str> {
        match self {
            Expectation::ColumnsMatchSet { .. } => None,
            Expectation::ColumnValuesNotNull { column }
            | Expectation::ColumnValuesBetween { column, .. }
            | Expectation::ColumnValuesInSet { column, .. }
            | Expectation::ColumnValuesMatchRegex { column, .. }
            | Expectation::ColumnValuesUnique { column } => Some(column),
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::ColumnsMatchSet { columns, exact_match } => write!(
                f,
                "columns {} [{}]",
                if *exact_match { "match" } else { "include" },
                columns.join(", ")
            ),
            Expectation::ColumnValuesNotNull { column } => write!(f, "{} is never null", column),
            Expectation::ColumnValuesBetween { column, min, max } => {
                let lo = min.map(|m| m.to_string()).unwrap_or_else(|| "-inf".to_string());
                let hi = max.map(|m| m.to_string()).unwrap_or_else(|| "inf".to_string());
                write!(f, "{} within [{}, {}]", column, lo, hi)
            }
            Expectation::ColumnValuesInSet { column, values } => {
                write!(f, "{} in {{{}}}", column, values.join(", "))
            }
            Expectation::ColumnValuesMatchRegex { column, regex } => {
                write!(f, "{} matches /{}/", column, regex)
            }
            Expectation::ColumnValuesUnique { column } => write!(f, "{} is unique", column),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpectationResult {
    pub expectation: Expectation,
    pub success: bool,
    pub unexpected_count: usize,
    pub unexpected_sample: Vec<Value>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub success: bool,
    pub results: Vec<ExpectationResult>,
}

impl ValidationReport {
    pub fn failures(&self) -> impl Iterator<Item = &ExpectationResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

/// Check every expectation against the dataset
pub fn validate(dataset: &Dataset, expectations: &[Expectation]) -> Result<ValidationReport> {
    let results = expectations
        .iter()
        .map(|e| check(dataset, e))
        .collect::<Result<Vec<_>>>()?;
    let success = results.iter().all(|r| r.success);
    log::info!(
        "Validated {} expectations: {} failed",
        results.len(),
        results.iter().filter(|r| !r.success).count()
    );
    Ok(ValidationReport { success, results })
}

fn check(dataset: &Dataset, expectation: &Expectation) -> Result<ExpectationResult> {
    if let Expectation::ColumnsMatchSet {
        columns,
        exact_match,
    } = expectation
    {
        return Ok(check_columns(dataset, expectation, columns, *exact_match));
    }

    let re = match expectation {
        Expectation::ColumnValuesMatchRegex { regex, .. } => Some(Regex::new(regex).map_err(|e| {
            CleanError::invalid_input(format!("invalid regex '{}': {}", regex, e))
        })?),
        _ => None,
    };

    let Some(name) = expectation.column() else {
        unreachable!("every other expectation targets a column")
    };
    let Some(idx) = dataset.column_index(name) else {
        return Ok(ExpectationResult {
            expectation: expectation.clone(),
            success: false,
            unexpected_count: 0,
            unexpected_sample: Vec::new(),
            message: format!("column '{}' does not exist", name),
        });
    };

    let unexpected: Vec<&Value> = match expectation {
        Expectation::ColumnValuesNotNull { .. } => {
            dataset.column(idx).filter(|v| v.is_null()).collect()
        }
        Expectation::ColumnValuesBetween { min, max, .. } => dataset
            .column(idx)
            .filter(|v| !v.is_null())
            .filter(|v| match v.as_f64() {
                Some(x) => min.is_some_and(|m| x < m) || max.is_some_and(|m| x > m),
                None => true,
            })
            .collect(),
        Expectation::ColumnValuesInSet { values, .. } => {
            let allowed: HashSet<ValueKey> =
                values.iter().map(|s| Value::parse(s).key()).collect();
            dataset
                .column(idx)
                .filter(|v| !v.is_null() && !allowed.contains(&v.key()))
                .collect()
        }
        Expectation::ColumnValuesMatchRegex { .. } => match &re {
            Some(re) => dataset
                .column(idx)
                .filter(|v| !v.is_null() && !re.is_match(&v.to_string()))
                .collect(),
            None => Vec::new(),
        },
        Expectation::ColumnValuesUnique { .. } => {
            let mut counts: HashMap<ValueKey, usize> = HashMap::new();
            for v in dataset.column(idx).filter(|v| !v.is_null()) {
                *counts.entry(v.key()).or_default() += 1;
            }
            dataset
                .column(idx)
                .filter(|v| !v.is_null() && counts[&v.key()] > 1)
                .collect()
        }
        Expectation::ColumnsMatchSet { .. } => Vec::new(),
    };

    let unexpected_count = unexpected.len();
    let success = unexpected_count == 0;
    Ok(ExpectationResult {
        expectation: expectation.clone(),
        success,
        unexpected_count,
        unexpected_sample: unexpected
            .into_iter()
            .take(UNEXPECTED_SAMPLE)
            .cloned()
            .collect(),
        message: if success {
            "ok".to_string()
        } else {
            format!("{} of {} values unexpected", unexpected_count, dataset.len())
        },
    })
}

fn check_columns(
    dataset: &Dataset,
    expectation: &Expectation,
    expected: &[String],
    exact_match: bool,
) -> ExpectationResult {
    let actual: HashSet<&str> = dataset.headers().iter().map(String::as_str).collect();
    let wanted: HashSet<&str> = expected.iter().map(String::as_str).collect();

    let mut missing: Vec<&str> = wanted.difference(&actual).copied().collect();
    let mut extra: Vec<&str> = if exact_match {
        actual.difference(&wanted).copied().collect()
    } else {
        Vec::new()
    };
    missing.sort_unstable();
    extra.sort_unstable();

    let success = missing.is_empty() && extra.is_empty();
    let mut message = Vec::new();
    if !missing.is_empty() {
        message.push(format!("missing: {}", missing.join(", ")));
    }
    if !extra.is_empty() {
        message.push(format!("unexpected: {}", extra.join(", ")));
    }

    ExpectationResult {
        expectation: expectation.clone(),
        success,
        unexpected_count: missing.len() + extra.len(),
        unexpected_sample: Vec::new(),
        message: if success {
            "ok".to_string()
        } else {
            message.join("; ")
        },
    }
}
