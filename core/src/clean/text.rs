//! Text cell formatting

use crate::data::{Dataset, Value};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Case normalisation applied to text cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextCase {
    #[default]
    Keep,
    Lower,
    Upper,
    Title,
}

impl FromStr for TextCase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keep" | "none" => Ok(TextCase::Keep),
            "lower" | "lowercase" => Ok(TextCase::Lower),
            "upper" | "uppercase" => Ok(TextCase::Upper),
            "title" | "titlecase" => Ok(TextCase::Title),
            _ => Err(format!("Unknown text case: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    pub trim: bool,
    pub collapse_whitespace: bool,
    pub strip_control: bool,
    #[serde(rename = "text_case")]
    pub case: TextCase,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            trim: true,
            collapse_whitespace: true,
            strip_control: true,
            case: TextCase::Keep,
        }
    }
}

impl TextOptions {
    /// Format a single string according to the options
    pub fn apply(&self, input: &str) -> String {
        let mut s: String = if self.strip_control {
            input
                .chars()
                .filter(|c| !c.is_control() || *c == ' ' || *c == '\t')
                .collect()
        } else {
            input.to_string()
        };

        if self.collapse_whitespace {
            s = s.split_whitespace().collect::<Vec<_>>().join(" ");
        } else if self.trim {
            s = s.trim().to_string();
        }

        match self.case {
            TextCase::Keep => s,
            TextCase::Lower => s.to_lowercase(),
            TextCase::Upper => s.to_uppercase(),
            TextCase::Title => title_case(&s),
        }
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = c.is_whitespace() || c == '-';
        }
    }
    out
}

/// Format every text cell; returns the number of cells changed.
///
/// Cells that format to an empty string become null.
pub fn format_text(dataset: &mut Dataset, options: &TextOptions) -> usize {
    let mut changed = 0;
    for col in 0..dataset.width() {
        dataset.map_column(col, |cell| {
            if let Value::Text(s) = cell {
                let formatted = options.apply(s);
                if formatted.is_empty() {
                    *cell = Value::Null;
                    changed += 1;
                } else if formatted != *s {
                    *s = formatted;
                    changed += 1;
                }
            }
        });
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_formatting() {
        let opts = TextOptions::default();
        assert_eq!(opts.apply("  New \t York  "), "New York");
        assert_eq!(opts.apply("a\u{0007}b"), "ab");
    }

    #[test]
    fn test_case_conversion() {
        let mut opts = TextOptions::default();
        opts.case = TextCase::Title;
        assert_eq!(opts.apply("jean-luc PICARD"), "Jean-Luc Picard");
        opts.case = TextCase::Lower;
        assert_eq!(opts.apply("MiXeD"), "mixed");
        assert_eq!("UPPER".parse::<TextCase>().unwrap(), TextCase::Upper);
        assert!("sideways".parse::<TextCase>().is_err());
    }

    #[test]
    fn test_format_dataset() {
        let mut ds = Dataset::new(
            vec!["city".to_string()],
            vec![
                vec![Value::Text(" paris ".to_string())],
                vec![Value::Text("Rome".to_string())],
                vec![Value::Text("\u{0007}".to_string())],
                vec![Value::Int(3)],
            ],
        )
        .unwrap();

        let changed = format_text(&mut ds, &TextOptions::default());
        assert_eq!(changed, 2);
        assert_eq!(ds.cell(0, 0), Some(&Value::Text("paris".to_string())));
        assert_eq!(ds.cell(2, 0), Some(&Value::Null));
    }
}
