//! Cell values and column types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw strings read as missing, matching the usual dataframe NA set.
pub const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A single dataset cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Parse a raw CSV field
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if is_missing_token(trimmed) {
            return Value::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Int(i);
        }
        if looks_numeric(trimmed) {
            if let Ok(f) = trimmed.parse::<f64>() {
                if f.is_finite() {
                    return Value::Float(f);
                }
            }
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        Value::Text(raw.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value; booleans are not numeric
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Normalised key used for equality across representations.
    ///
    /// `Int(1)` and `Float(1.0)` share a key; integers are keyed exactly and
    /// text keeps its exact content.
    pub fn key(&self) -> ValueKey {
        match self {
            Value::Null => ValueKey::Null,
            Value::Bool(b) => ValueKey::Bool(*b),
            Value::Int(i) => ValueKey::Int(*i),
            Value::Float(f) => match integral_f64(*f) {
                Some(i) => ValueKey::Int(i),
                None => ValueKey::Float(f.to_bits()),
            },
            Value::Text(s) => ValueKey::Text(s.clone()),
        }
    }

    /// Type of a single non-null value
    pub fn value_type(&self) -> ColumnType {
        match self {
            Value::Null => ColumnType::Empty,
            Value::Bool(_) => ColumnType::Boolean,
            Value::Int(_) => ColumnType::Integer,
            Value::Float(_) => ColumnType::Float,
            Value::Text(_) => ColumnType::Text,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) if x.fract() == 0.0 && x.abs() < 1e16 => write!(f, "{:.1}", x),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Hashable identity of a [`Value`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKey {
    Null,
    Bool(bool),
    Int(i64),
    /// Bit pattern of a float with no exact integer form
    Float(u64),
    Text(String),
}

// -0.0 maps to 0; values outside the i64 range stay floats.
fn integral_f64(f: f64) -> Option<i64> {
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    if f.fract() == 0.0 && (-BOUND..BOUND).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

/// Inferred type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Empty,
    Boolean,
    Integer,
    Float,
    Text,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Infer the narrowest type that covers every non-null value
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        values
            .into_iter()
            .filter(|v| !v.is_null())
            .fold(ColumnType::Empty, |acc, v| acc.widen(v.value_type()))
    }

    fn widen(self, other: ColumnType) -> ColumnType {
        use ColumnType::*;
        match (self, other) {
            (Empty, t) | (t, Empty) => t,
            (a, b) if a == b => a,
            (Integer, Float) | (Float, Integer) => Float,
            _ => Text,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Empty => "empty",
            ColumnType::Boolean => "boolean",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
        };
        f.write_str(name)
    }
}

pub fn is_missing_token(s: &str) -> bool {
    MISSING_TOKENS.contains(&s)
}

// Rust's float parser accepts "inf" and "nan"; only digit-based literals count here.
fn looks_numeric(s: &str) -> bool {
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    body.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && body.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_missing_tokens() {
        for token in ["", "  ", "NA", "n/a", "NULL", "NaN", "None", "<NA>"] {
            assert_eq!(Value::parse(token), Value::Null, "token {:?}", token);
        }
        assert_eq!(Value::parse("none"), Value::Text("none".to_string()));
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!(Value::parse(" 42 "), Value::Int(42));
        assert_eq!(Value::parse("-3.5"), Value::Float(-3.5));
        assert_eq!(Value::parse("1e3"), Value::Float(1000.0));
        assert_eq!(Value::parse("TRUE"), Value::Bool(true));
        assert_eq!(Value::parse("inf"), Value::Text("inf".to_string()));
        assert_eq!(Value::parse(" Alice "), Value::Text(" Alice ".to_string()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(2.25).to_string(), "2.25");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn test_key_unifies_numbers() {
        assert_eq!(Value::Int(1).key(), Value::Float(1.0).key());
        assert_eq!(Value::Float(-0.0).key(), Value::Float(0.0).key());
        assert_ne!(Value::Int(1).key(), Value::Text("1".to_string()).key());
        assert_ne!(Value::Float(0.5).key(), Value::Int(0).key());
    }

    #[test]
    fn test_key_keeps_large_integers_apart() {
        let a = Value::Int(9_007_199_254_740_992);
        let b = Value::Int(9_007_199_254_740_993);
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), Value::Float(9_007_199_254_740_992.0).key());
        assert_ne!(Value::Int(i64::MAX).key(), Value::Float(9.3e18).key());
    }

    #[test]
    fn test_infer_column_type() {
        let ints = [Value::Int(1), Value::Null, Value::Int(3)];
        assert_eq!(ColumnType::infer(&ints), ColumnType::Integer);

        let mixed = [Value::Int(1), Value::Float(2.5)];
        assert_eq!(ColumnType::infer(&mixed), ColumnType::Float);

        let text = [Value::Int(1), Value::Text("x".to_string())];
        assert_eq!(ColumnType::infer(&text), ColumnType::Text);

        assert_eq!(ColumnType::infer(&[Value::Null]), ColumnType::Empty);
    }
}
