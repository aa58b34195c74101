//! Output formatting module
//!
//! Renders cleaning reports, profiles, validation results and agent output
//! for the terminal using colored output. Each `render_*` method returns the
//! text; the `print_*` methods write it to stdout.

use crate::agent::AgentOutput;
use crate::clean::CleaningReport;
use crate::profile::DatasetProfile;
use crate::validate::ValidationReport;
use console::Style;
use std::fmt::Write;

/// Output formatter for CLI results
pub struct OutputFormatter {
    // Styles
    blue: Style,
    green: Style,
    yellow: Style,
    red: Style,
    bold: Style,
    dim: Style,
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self {
            blue: Style::new().blue(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            bold: Style::new().bold(),
            dim: Style::new().dim(),
        }
    }
}

impl OutputFormatter {
    /// Create a new formatter
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render_report(&self, report: &CleaningReport) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.bold.apply_to("Cleaning Report:"));
        let _ = writeln!(
            out,
            "Rows: {} -> {}",
            report.rows_in,
            self.green.apply_to(report.rows_out)
        );
        let _ = writeln!(
            out,
            "Missing cells: {} -> {}",
            report.missing_before,
            self.green.apply_to(report.missing_after)
        );
        if report.text_cells_changed > 0 {
            let _ = writeln!(out, "Text cells reformatted: {}", report.text_cells_changed);
        }

        for c in &report.conversions {
            let _ = writeln!(
                out,
                "- {} converted {} -> {} ({} cells)",
                self.blue.apply_to(&c.column),
                c.from,
                c.to,
                c.cells_changed
            );
        }
        for i in &report.imputations {
            let fallback = if i.fell_back {
                self.dim.apply_to(" (fallback)").to_string()
            } else {
                String::new()
            };
            let _ = writeln!(
                out,
                "- {} filled {} with {} = {}{}",
                self.blue.apply_to(&i.column),
                i.filled,
                i.strategy,
                i.value,
                fallback
            );
        }
        for col in &report.unimputable_columns {
            let _ = writeln!(
                out,
                "- {} {}",
                self.blue.apply_to(col),
                self.yellow.apply_to("has no values to impute from")
            );
        }
        if report.duplicates_removed > 0 {
            let _ = writeln!(out, "Duplicate rows removed: {}", report.duplicates_removed);
        }
        out
    }

    pub fn print_report(&self, report: &CleaningReport) {
        println!();
        print!("{}", self.render_report(report));
    }

    pub fn render_profile(&self, profile: &DatasetProfile) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} {} rows, {} columns",
            self.bold.apply_to("Profile:"),
            profile.row_count,
            profile.columns.len()
        );
        for col in &profile.columns {
            let _ = writeln!(
                out,
                "\n{} ({})",
                self.bold.apply_to(&col.name),
                self.blue.apply_to(col.column_type)
            );
            let null_style = if col.null_count > 0 {
                &self.yellow
            } else {
                &self.green
            };
            let _ = writeln!(
                out,
                "  nulls: {}  non-null: {:.1}%  distinct: {}",
                null_style.apply_to(col.null_count),
                col.non_null_proportion * 100.0,
                col.distinct_count
            );
            if let Some(s) = &col.stats {
                let _ = writeln!(
                    out,
                    "  min: {}  max: {}  mean: {:.4}  median: {}  std: {:.4}",
                    s.min, s.max, s.mean, s.median, s.standard_deviation
                );
            }
            if !col.sample_values.is_empty() {
                let sample: Vec<String> = col.sample_values.iter().map(|v| v.to_string()).collect();
                let _ = writeln!(out, "  sample: {}", self.dim.apply_to(sample.join(", ")));
            }
        }
        out
    }

    pub fn print_profile(&self, profile: &DatasetProfile) {
        print!("{}", self.render_profile(profile));
    }

    pub fn render_validation(&self, report: &ValidationReport) -> String {
        let mut out = String::new();
        for r in &report.results {
            let mark = if r.success {
                self.green.apply_to("PASS")
            } else {
                self.red.apply_to("FAIL")
            };
            let _ = writeln!(out, "[{}] {}", mark, r.expectation);
            if !r.success {
                let _ = writeln!(out, "       {}", r.message);
                if !r.unexpected_sample.is_empty() {
                    let sample: Vec<String> =
                        r.unexpected_sample.iter().map(|v| format!("{:?}", v.to_string())).collect();
                    let _ = writeln!(out, "       e.g. {}", self.dim.apply_to(sample.join(", ")));
                }
            }
        }
        let failed = report.failures().count();
        let summary = format!("{} passed, {} failed", report.results.len() - failed, failed);
        let _ = writeln!(
            out,
            "{}",
            if report.success {
                self.green.apply_to(summary)
            } else {
                self.red.apply_to(summary)
            }
        );
        out
    }

    pub fn print_validation(&self, report: &ValidationReport) {
        print!("{}", self.render_validation(report));
    }

    /// Print the agent's cleaned text followed by token usage
    pub fn print_agent_output(&self, output: &AgentOutput) {
        println!();
        println!("{}", self.bold.apply_to("Cleaned Data:"));
        println!("{}", output.text());
        println!();
        println!("{}", self.blue.apply_to(output.usage));
    }
}
