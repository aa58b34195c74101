//! Deterministic cleaning pipeline
//!
//! Steps run in a fixed order: text formatting, type conversion, imputation,
//! deduplication. Formatting comes first so padded numbers convert, and
//! deduplication comes last so rows made identical by imputation collapse.

pub mod convert;
pub mod dedup;
pub mod impute;
pub mod text;

pub use convert::{convert_types, lenient_parse, Conversion};
pub use dedup::drop_duplicates;
pub use impute::{ColumnFill, ImputeStrategy, StatisticalImputer};
pub use text::{format_text, TextCase, TextOptions};

use crate::data::{Dataset, Value};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Options for [`CleaningPipeline`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningOptions {
    pub convert_types: bool,
    pub impute: ImputeStrategy,
    /// Per-column strategy overrides
    pub column_strategies: HashMap<String, ImputeStrategy>,
    pub deduplicate: bool,
    /// Columns compared when deduplicating (all when empty)
    pub dedup_columns: Vec<String>,
    #[serde(flatten)]
    pub text: TextOptions,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            convert_types: true,
            impute: ImputeStrategy::Auto,
            column_strategies: HashMap::new(),
            deduplicate: true,
            dedup_columns: Vec::new(),
            text: TextOptions::default(),
        }
    }
}

/// Imputation outcome for one column
#[derive(Debug, Clone, Serialize)]
pub struct ImputationRecord {
    pub column: String,
    pub strategy: String,
    pub value: Value,
    pub filled: usize,
    pub fell_back: bool,
}

/// What the pipeline did
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleaningReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub missing_before: usize,
    pub missing_after: usize,
    pub text_cells_changed: usize,
    pub conversions: Vec<Conversion>,
    pub imputations: Vec<ImputationRecord>,
    pub unimputable_columns: Vec<String>,
    pub duplicates_removed: usize,
}

impl CleaningReport {
    pub fn cells_imputed(&self) -> usize {
        self.imputations.iter().map(|i| i.filled).sum()
    }
}

pub struct CleaningPipeline {
    options: CleaningOptions,
}

impl CleaningPipeline {
    pub fn new(options: CleaningOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CleaningOptions {
        &self.options
    }

    /// Clean a dataset, returning the cleaned copy and a report
    pub fn run(&self, dataset: &Dataset) -> Result<(Dataset, CleaningReport)> {
        let mut data = dataset.clone();
        let mut report = CleaningReport {
            rows_in: data.len(),
            missing_before: data.missing_count(),
            ..Default::default()
        };

        report.text_cells_changed = format_text(&mut data, &self.options.text);

        if self.options.convert_types {
            report.conversions = convert_types(&mut data);
        }

        let mut imputer = self
            .options
            .column_strategies
            .iter()
            .fold(StatisticalImputer::new(self.options.impute.clone()), |imp, (col, s)| {
                imp.with_column_strategy(col.clone(), s.clone())
            });
        imputer.fit(&data)?;
        let counts = imputer.transform(&mut data);
        for (fill, filled) in imputer.fills().iter().zip(counts) {
            match &fill.value {
                Some(value) => report.imputations.push(ImputationRecord {
                    column: fill.column.clone(),
                    strategy: fill.strategy.to_string(),
                    value: value.clone(),
                    filled,
                    fell_back: fill.fell_back,
                }),
                None => report.unimputable_columns.push(fill.column.clone()),
            }
        }

        if self.options.deduplicate {
            let subset = Some(self.options.dedup_columns.as_slice());
            report.duplicates_removed = drop_duplicates(&mut data, subset)?;
        }

        report.rows_out = data.len();
        report.missing_after = data.missing_count();

        log::info!(
            "Cleaned {} rows -> {} rows ({} cells imputed, {} duplicates removed)",
            report.rows_in,
            report.rows_out,
            report.cells_imputed(),
            report.duplicates_removed
        );
        Ok((data, report))
    }
}
