//! Statistical imputation of missing values (mean, median, mode)

use crate::data::{ColumnType, Dataset, Value, ValueKey};
use crate::error::CleanError;
use crate::stats;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// |skewness| above which `Auto` prefers the median over the mean
const SKEW_THRESHOLD: f64 = 1.0;
/// Below this many numeric values `Auto` always uses the median
const MIN_VALUES_FOR_MEAN: usize = 3;

/// How missing values in a column are filled
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ImputeStrategy {
    Mean,
    Median,
    Mode,
    /// Fill with a fixed value, parsed like a CSV field
    Constant(String),
    /// Pick mean, median or mode from the column's type and shape
    #[default]
    Auto,
    /// Leave missing values in place
    Skip,
}

impl FromStr for ImputeStrategy {
    type Err = CleanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if let Some((prefix, value)) = s.trim().split_once(':') {
            if matches!(prefix.to_lowercase().as_str(), "const" | "constant") {
                return Ok(ImputeStrategy::Constant(value.to_string()));
            }
        }
        match lower.as_str() {
            "mean" => Ok(ImputeStrategy::Mean),
            "median" => Ok(ImputeStrategy::Median),
            "mode" | "most_frequent" => Ok(ImputeStrategy::Mode),
            "auto" => Ok(ImputeStrategy::Auto),
            "skip" | "none" => Ok(ImputeStrategy::Skip),
            _ => Err(CleanError::invalid_input(format!(
                "unknown imputation strategy '{}' (expected mean, median, mode, auto, skip or const:VALUE)",
                s
            ))),
        }
    }
}

impl TryFrom<String> for ImputeStrategy {
    type Error = CleanError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ImputeStrategy> for String {
    fn from(strategy: ImputeStrategy) -> String {
        strategy.to_string()
    }
}

impl fmt::Display for ImputeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImputeStrategy::Mean => write!(f, "mean"),
            ImputeStrategy::Median => write!(f, "median"),
            ImputeStrategy::Mode => write!(f, "mode"),
            ImputeStrategy::Constant(v) => write!(f, "const:{}", v),
            ImputeStrategy::Auto => write!(f, "auto"),
            ImputeStrategy::Skip => write!(f, "skip"),
        }
    }
}

/// The fill value chosen for one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnFill {
    #[serde(skip)]
    pub index: usize,
    pub column: String,
    /// Strategy actually used (never `Auto`)
    pub strategy: ImputeStrategy,
    /// `None` when the column has nothing to compute a fill from
    pub value: Option<Value>,
    /// Mean/median was requested on a non-numeric column and mode was used
    pub fell_back: bool,
}

/// Fits fill values per column and applies them
#[derive(Debug, Clone, Default)]
pub struct StatisticalImputer {
    default: ImputeStrategy,
    overrides: HashMap<String, ImputeStrategy>,
    fills: Vec<ColumnFill>,
}

impl StatisticalImputer {
    pub fn new(default: ImputeStrategy) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
            fills: Vec::new(),
        }
    }

    /// Use a different strategy for one column
    pub fn with_column_strategy(
        mut self,
        column: impl Into<String>,
        strategy: ImputeStrategy,
    ) -> Self {
        self.overrides.insert(column.into(), strategy);
        self
    }

    pub fn fills(&self) -> &[ColumnFill] {
        &self.fills
    }

    /// Compute fill values for every column that has missing cells.
    ///
    /// Column overrides naming unknown columns are an error.
    pub fn fit(&mut self, dataset: &Dataset) -> crate::error::Result<&[ColumnFill]> {
        for name in self.overrides.keys() {
            dataset.require_column(name)?;
        }

        self.fills.clear();
        for (index, name) in dataset.headers().iter().enumerate() {
            if !dataset.column(index).any(Value::is_null) {
                continue;
            }
            let requested = self.overrides.get(name).unwrap_or(&self.default);
            if *requested == ImputeStrategy::Skip {
                continue;
            }
            let fill = fit_column(dataset, index, requested);
            match &fill.value {
                Some(v) => log::debug!("Column '{}': {} fill = {}", name, fill.strategy, v),
                None => log::warn!("Column '{}' has no values to impute from", name),
            }
            self.fills.push(fill);
        }
        Ok(&self.fills)
    }

    /// Replace nulls with the fitted values; returns per-column fill counts
    pub fn transform(&self, dataset: &mut Dataset) -> Vec<usize> {
        self.fills
            .iter()
            .map(|fill| {
                let Some(value) = &fill.value else {
                    return 0;
                };
                let mut filled = 0;
                dataset.map_column(fill.index, |cell| {
                    if cell.is_null() {
                        *cell = value.clone();
                        filled += 1;
                    }
                });
                filled
            })
            .collect()
    }
}

fn fit_column(dataset: &Dataset, index: usize, requested: &ImputeStrategy) -> ColumnFill {
    let column_type = dataset.column_type(index);
    let numbers: Vec<f64> = dataset.column(index).filter_map(Value::as_f64).collect();

    let strategy = match requested {
        ImputeStrategy::Auto => auto_strategy(column_type, &numbers),
        other => other.clone(),
    };

    let (strategy, fell_back) = match strategy {
        ImputeStrategy::Mean | ImputeStrategy::Median if !column_type.is_numeric() => {
            (ImputeStrategy::Mode, column_type != ColumnType::Empty)
        }
        s => (s, false),
    };

    let value = match &strategy {
        ImputeStrategy::Mean => stats::mean(&numbers).and_then(|m| numeric_fill(m, column_type)),
        ImputeStrategy::Median => {
            stats::median(&numbers).and_then(|m| numeric_fill(m, column_type))
        }
        ImputeStrategy::Mode => mode(dataset.column(index)),
        ImputeStrategy::Constant(raw) => Some(Value::parse(raw)).filter(|v| !v.is_null()),
        ImputeStrategy::Auto | ImputeStrategy::Skip => None,
    };

    ColumnFill {
        index,
        column: dataset.headers()[index].clone(),
        strategy,
        value,
        fell_back,
    }
}

fn auto_strategy(column_type: ColumnType, numbers: &[f64]) -> ImputeStrategy {
    if !column_type.is_numeric() {
        return ImputeStrategy::Mode;
    }
    if numbers.len() < MIN_VALUES_FOR_MEAN {
        return ImputeStrategy::Median;
    }
    match stats::skewness(numbers) {
        Some(skew) if skew.abs() > SKEW_THRESHOLD => ImputeStrategy::Median,
        _ => ImputeStrategy::Mean,
    }
}

// Integer columns stay integer: round half away from zero. A statistic that
// overflowed to a non-finite value gives no fill.
fn numeric_fill(x: f64, column_type: ColumnType) -> Option<Value> {
    if !x.is_finite() {
        return None;
    }
    Some(if column_type == ColumnType::Integer {
        Value::Int(x.round() as i64)
    } else {
        Value::Float(x)
    })
}

/// Most frequent non-null value; ties go to the value seen first
pub fn mode<'a>(values: impl Iterator<Item = &'a Value>) -> Option<Value> {
    let mut counts: HashMap<ValueKey, (usize, usize, &Value)> = HashMap::new();
    for (pos, value) in values.filter(|v| !v.is_null()).enumerate() {
        counts
            .entry(value.key())
            .and_modify(|entry| entry.0 += 1)
            .or_insert((1, pos, value));
    }
    counts
        .into_values()
        .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
        .map(|(_, _, v)| v.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::from_strings(
            &["age", "income", "city", "empty"],
            &[
                vec!["30", "1000.0", "Paris", ""],
                vec!["", "1200.0", "Rome", ""],
                vec!["41", "", "Paris", ""],
                vec!["35", "90000.0", "", ""],
                vec!["36", "1100.0", "Rome", ""],
                vec!["33", "1050.0", "Oslo", ""],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("Median".parse::<ImputeStrategy>().unwrap(), ImputeStrategy::Median);
        assert_eq!(
            "const:unknown".parse::<ImputeStrategy>().unwrap(),
            ImputeStrategy::Constant("unknown".to_string())
        );
        assert!("average".parse::<ImputeStrategy>().is_err());
        assert_eq!(ImputeStrategy::Constant("0".to_string()).to_string(), "const:0");
    }

    #[test]
    fn test_auto_picks_by_shape() {
        let ds = dataset();
        let mut imputer = StatisticalImputer::new(ImputeStrategy::Auto);
        let fills = imputer.fit(&ds).unwrap().to_vec();

        let age = fills.iter().find(|f| f.column == "age").unwrap();
        assert_eq!(age.strategy, ImputeStrategy::Mean);
        // (30 + 41 + 35 + 36 + 33) / 5 = 35
        assert_eq!(age.value, Some(Value::Int(35)));

        // 90000 is an outlier, so the income distribution is skewed
        let income = fills.iter().find(|f| f.column == "income").unwrap();
        assert_eq!(income.strategy, ImputeStrategy::Median);
        assert_eq!(income.value, Some(Value::Float(1100.0)));

        let city = fills.iter().find(|f| f.column == "city").unwrap();
        assert_eq!(city.strategy, ImputeStrategy::Mode);
        assert_eq!(city.value, Some(Value::Text("Paris".to_string())));

        let empty = fills.iter().find(|f| f.column == "empty").unwrap();
        assert_eq!(empty.value, None);
    }

    #[test]
    fn test_transform_fills_nulls() {
        let mut ds = dataset();
        let mut imputer = StatisticalImputer::new(ImputeStrategy::Auto);
        imputer.fit(&ds).unwrap();
        let counts = imputer.transform(&mut ds);
        assert_eq!(counts, vec![1, 1, 1, 0]);
        // only the unimputable column keeps its nulls
        assert_eq!(ds.missing_count(), 6);
    }

    #[test]
    fn test_mean_on_text_falls_back_to_mode() {
        let ds = dataset();
        let mut imputer = StatisticalImputer::new(ImputeStrategy::Skip)
            .with_column_strategy("city", ImputeStrategy::Mean);
        let fills = imputer.fit(&ds).unwrap();
        assert_eq!(fills.len(), 1);
        assert!(fills[0].fell_back);
        assert_eq!(fills[0].strategy, ImputeStrategy::Mode);
    }

    #[test]
    fn test_constant_fill() {
        let mut ds = dataset();
        let mut imputer = StatisticalImputer::new(ImputeStrategy::Skip)
            .with_column_strategy("empty", ImputeStrategy::Constant("0".to_string()));
        imputer.fit(&ds).unwrap();
        imputer.transform(&mut ds);
        assert!(ds.column(3).all(|v| *v == Value::Int(0)));
    }

    #[test]
    fn test_unknown_override_column() {
        let ds = dataset();
        let mut imputer = StatisticalImputer::new(ImputeStrategy::Auto)
            .with_column_strategy("zip", ImputeStrategy::Mode);
        assert!(matches!(
            imputer.fit(&ds),
            Err(CleanError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_mode_ties_go_to_first_seen() {
        let values = [
            Value::Text("b".to_string()),
            Value::Null,
            Value::Text("a".to_string()),
            Value::Text("a".to_string()),
            Value::Text("b".to_string()),
        ];
        assert_eq!(mode(values.iter()), Some(Value::Text("b".to_string())));
        assert_eq!(mode([Value::Null].iter()), None);
    }

    #[test]
    fn test_integer_mean_rounds_half_away_from_zero() {
        assert_eq!(numeric_fill(2.5, ColumnType::Integer), Some(Value::Int(3)));
        assert_eq!(numeric_fill(-2.5, ColumnType::Integer), Some(Value::Int(-3)));
        assert_eq!(numeric_fill(2.5, ColumnType::Float), Some(Value::Float(2.5)));
    }

    #[test]
    fn test_auto_uses_median_for_few_values() {
        let ds = Dataset::from_strings(
            &["n", "flag"],
            &[
                vec!["1", "true"],
                vec!["", "false"],
                vec!["10", ""],
                vec!["", "true"],
            ],
        )
        .unwrap();
        let mut imputer = StatisticalImputer::new(ImputeStrategy::Auto);
        let fills = imputer.fit(&ds).unwrap();

        assert_eq!(fills[0].strategy, ImputeStrategy::Median);
        // median of 1 and 10 rounded for an integer column
        assert_eq!(fills[0].value, Some(Value::Int(6)));

        assert_eq!(fills[1].column, "flag");
        assert_eq!(fills[1].strategy, ImputeStrategy::Mode);
        assert_eq!(fills[1].value, Some(Value::Bool(true)));
        assert!(!fills[1].fell_back);
    }

    #[test]
    fn test_overflowing_mean_is_not_filled() {
        let mut ds = Dataset::from_strings(
            &["big"],
            &[vec!["1e308"], vec!["1e308"], vec![""]],
        )
        .unwrap();
        let mut imputer = StatisticalImputer::new(ImputeStrategy::Mean);
        let fills = imputer.fit(&ds).unwrap();
        assert_eq!(fills[0].value, None);
        assert_eq!(imputer.transform(&mut ds), vec![0]);
        assert!(ds.cell(2, 0).unwrap().is_null());
    }
}
