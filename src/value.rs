// Value types shared by the datasource layer and the template resolver
//
// SqlValue is what a datasource hands back for a single cell.
// Scalar is the closed set of values a template can see: parameters
// supplied by the caller and cells after row shaping.

use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::cmp::Ordering;
use std::fmt;

/// A raw cell as returned by a datasource driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Boolean(bool),
}

impl SqlValue {
    /// Position of the variant in the total order used by indexes.
    /// Integers and floats share a rank so they compare numerically.
    fn rank(&self) -> u8 {
        match self {
            SqlValue::Null => 0,
            SqlValue::Boolean(_) => 1,
            SqlValue::Integer(_) | SqlValue::Float(_) => 2,
            SqlValue::Text(_) => 3,
            SqlValue::Bytes(_) => 4,
        }
    }

    /// Total ordering across all values, so they can key a BTreeMap
    pub fn compare(&self, other: &SqlValue) -> Ordering {
        match (self, other) {
            (SqlValue::Integer(a), SqlValue::Integer(b)) => a.cmp(b),
            (SqlValue::Float(a), SqlValue::Float(b)) => a.total_cmp(b),
            (SqlValue::Integer(a), SqlValue::Float(b)) => (*a as f64).total_cmp(b),
            (SqlValue::Float(a), SqlValue::Integer(b)) => a.total_cmp(&(*b as f64)),
            (SqlValue::Text(a), SqlValue::Text(b)) => a.cmp(b),
            (SqlValue::Bytes(a), SqlValue::Bytes(b)) => a.cmp(b),
            (SqlValue::Boolean(a), SqlValue::Boolean(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    /// SQL equality for WHERE clauses: NULL never matches anything
    pub fn sql_eq(&self, other: &SqlValue) -> bool {
        if matches!(self, SqlValue::Null) || matches!(other, SqlValue::Null) {
            return false;
        }
        self.rank() == other.rank() && self.compare(other) == Ordering::Equal
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Integer(i) => write!(f, "{}", i),
            SqlValue::Float(x) => write!(f, "{}", x),
            SqlValue::Text(s) => write!(f, "{}", s),
            SqlValue::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            SqlValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// A template-visible value.
///
/// Serializes to plain JSON (`null`, `true`, `5`, `"text"`), which is also
/// the format parameters are read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    /// Build a number scalar from a float. Returns None for NaN and infinities,
    /// which have no JSON representation.
    pub fn from_f64(value: f64) -> Option<Scalar> {
        Number::from_f64(value).map(Scalar::Number)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

/// Substitution text for a scalar.
///
/// Whole floats below 1e21 print without a fractional part (`5.0` -> `5`);
/// null prints as the empty string.
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::String(s) => f.write_str(s),
            Scalar::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    return write!(f, "{}", n);
                }
                match n.as_f64() {
                    Some(x) if x.fract() == 0.0 && x.abs() < 1e21 => write!(f, "{:.0}", x),
                    Some(x) => write!(f, "{}", x),
                    None => write!(f, "{}", n),
                }
            }
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}
