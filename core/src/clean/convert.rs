//! Column type conversion
//!
//! Text cells are re-read with lenient number and boolean rules. A column is
//! converted only when every non-null cell agrees on one target type, so a
//! single free-text value keeps the whole column as text.

use crate::data::{ColumnType, Dataset, Value};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// One converted column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub column: String,
    pub from: ColumnType,
    pub to: ColumnType,
    pub cells_changed: usize,
}

fn thousands_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").expect("static regex is valid")
    })
}

/// Parse text that plain CSV parsing left as text.
///
/// Handles `1,234.5`, `$12`, `-€3.10`, `45%` and yes/no style booleans.
pub fn lenient_parse(text: &str) -> Option<Value> {
    let s = text.trim();

    match s.to_lowercase().as_str() {
        "yes" | "y" => return Some(Value::Bool(true)),
        "no" | "n" => return Some(Value::Bool(false)),
        _ => {}
    }

    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let body = body.trim_start_matches(['$', '€', '£', '¥']);
    if !body.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }

    let (body, percent) = match body.strip_suffix('%') {
        Some(rest) => (rest.trim_end(), true),
        None => (body, false),
    };

    let body = if thousands_re().is_match(body) {
        body.replace(',', "")
    } else {
        body.to_string()
    };

    let parsed = match Value::parse(&body) {
        Value::Int(i) if negative => match i.checked_neg() {
            Some(n) => Value::Int(n),
            None => Value::Float(-(i as f64)),
        },
        Value::Int(i) => Value::Int(i),
        Value::Float(f) => Value::Float(if negative { -f } else { f }),
        _ => return None,
    };

    if percent {
        parsed.as_f64().map(|f| Value::Float(f / 100.0))
    } else {
        Some(parsed)
    }
}

/// Convert one column in place if all of its values agree on a type
pub fn convert_column(dataset: &mut Dataset, col: usize) -> Option<Conversion> {
    let from = dataset.column_type(col);

    let mut candidates = Vec::with_capacity(dataset.len());
    for value in dataset.column(col) {
        let candidate = match value {
            Value::Text(s) => lenient_parse(s)?,
            other => other.clone(),
        };
        candidates.push(candidate);
    }

    let to = ColumnType::infer(&candidates);
    if matches!(to, ColumnType::Text | ColumnType::Empty) {
        return None;
    }

    let mut cells_changed = 0;
    let mut candidates = candidates.into_iter();
    dataset.map_column(col, |cell| {
        let mut next = candidates.next().unwrap_or(Value::Null);
        if to == ColumnType::Float {
            if let Value::Int(i) = next {
                next = Value::Float(i as f64);
            }
        }
        if *cell != next {
            *cell = next;
            cells_changed += 1;
        }
    });

    if cells_changed == 0 {
        return None;
    }

    let column = dataset.headers()[col].clone();
    log::debug!("Converted column '{}' from {} to {}", column, from, to);
    Some(Conversion {
        column,
        from,
        to,
        cells_changed,
    })
}

/// Convert every column that can be converted
pub fn convert_types(dataset: &mut Dataset) -> Vec<Conversion> {
    (0..dataset.width())
        .filter_map(|col| convert_column(dataset, col))
        .collect()
}
