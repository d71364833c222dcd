//! Cell values and rows.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single cell in a [`super::Table`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Infer a value from a raw spreadsheet cell.
    ///
    /// Empty cells become `Null`, then integers, floats and finally text are tried.
    pub fn parse_cell(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Int(i);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => Value::Float(f),
            Ok(_) => Value::Null,
            Err(_) => Value::Text(trimmed.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value. Text is not coerced.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Coerce to an integer cell, used by the fill policy.
    ///
    /// Floats are truncated and numeric text is parsed. Anything else yields `None`.
    pub fn coerce_int(&self) -> Option<Value> {
        match self {
            Value::Null => None,
            Value::Int(i) => Some(Value::Int(*i)),
            Value::Float(f) if f.is_finite() => Some(Value::Int(f.trunc() as i64)),
            Value::Float(_) => None,
            Value::Text(s) => match Value::parse_cell(s) {
                Value::Int(i) => Some(Value::Int(i)),
                Value::Float(f) => Some(Value::Int(f.trunc() as i64)),
                _ => None,
            },
        }
    }

    /// Coerce to a float cell, used by the fill policy.
    pub fn coerce_float(&self) -> Option<Value> {
        match self {
            Value::Null => None,
            Value::Int(i) => Some(Value::Float(*i as f64)),
            Value::Float(f) if f.is_finite() => Some(Value::Float(*f)),
            Value::Float(_) => None,
            Value::Text(s) => Value::parse_cell(s).as_f64().map(Value::Float),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Int(_) | Value::Float(_) => 1,
            Value::Text(_) => 2,
        }
    }

    /// Total order over values: `Null < numbers < text`.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (a, b) if a.kind_rank() != b.kind_rank() => a.kind_rank().cmp(&b.kind_rank()),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => Ordering::Equal,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            Value::Float(v)
        } else {
            Value::Null
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Composite key used for grouping, joining and pivoting.
#[derive(Debug, Clone)]
pub struct GroupKey(pub Vec<Value>);

impl GroupKey {
    pub fn has_null(&self) -> bool {
        self.0.iter().any(Value::is_null)
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            let ord = a.total_cmp(b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

static NULL: Value = Value::Null;

/// One record: named fields mapped to values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a field, `Null` when absent.
    pub fn get(&self, column: &str) -> &Value {
        self.0.get(column).unwrap_or(&NULL)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(column.into(), value.into());
    }

    /// Builder method to set a field.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.remove(column)
    }

    pub fn f64(&self, column: &str) -> Option<f64> {
        self.get(column).as_f64()
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).as_str()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub(crate) fn key(&self, columns: &[String]) -> GroupKey {
        GroupKey(columns.iter().map(|c| self.get(c).clone()).collect())
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_inference() {
        assert_eq!(Value::parse_cell(""), Value::Null);
        assert_eq!(Value::parse_cell("  "), Value::Null);
        assert_eq!(Value::parse_cell("12"), Value::Int(12));
        assert_eq!(Value::parse_cell("1.5"), Value::Float(1.5));
        assert_eq!(Value::parse_cell("Ascent"), Value::Text("Ascent".into()));
    }

    #[test]
    fn test_total_order() {
        let mut values = vec![
            Value::Text("b".into()),
            Value::Float(2.5),
            Value::Null,
            Value::Int(3),
            Value::Int(1),
            Value::Text("a".into()),
        ];
        values.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Int(1),
                Value::Float(2.5),
                Value::Int(3),
                Value::Text("a".into()),
                Value::Text("b".into()),
            ]
        );
    }

    #[test]
    fn test_coerce() {
        assert_eq!(Value::Float(3.9).coerce_int(), Some(Value::Int(3)));
        assert_eq!(Value::Text("7".into()).coerce_int(), Some(Value::Int(7)));
        assert_eq!(Value::Text("abc".into()).coerce_int(), None);
        assert_eq!(Value::Int(2).coerce_float(), Some(Value::Float(2.0)));
        assert_eq!(Value::Null.coerce_float(), None);
    }

    #[test]
    fn test_row_missing_field_is_null() {
        let row = Row::new().with("kills", 10i64);
        assert_eq!(row.get("kills"), &Value::Int(10));
        assert!(row.get("deaths").is_null());
    }

    #[test]
    fn test_non_finite_float_becomes_null() {
        assert_eq!(Value::from(f64::NAN), Value::Null);
        assert_eq!(Value::from(f64::INFINITY), Value::Null);
    }
}
