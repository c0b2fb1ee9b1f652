//! The tagged `Value` every environment entry, handler input, and handler
//! output is expressed in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A scalar, array, or object value flowing through the environment.
///
/// `Object` uses a `Vec<(String, Value)>` rather than a `HashMap` so that
/// insertion order survives a round trip through `serde_json` — useful for
/// golden-output tests and for handlers that care about declared-field
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// UTF-8 string scalar.
    String(String),
    /// 64-bit signed integer scalar.
    Integer(i64),
    /// 64-bit float scalar.
    Float(f64),
    /// Boolean scalar.
    Bool(bool),
    /// The absence of a value.
    Null,
    /// An ordered array of values.
    Array(Vec<Value>),
    /// An ordered object mapping names to values.
    Object(Vec<(String, Value)>),
}

impl Value {
    /// Render the value as it would appear substituted into a `{{ name }}`
    /// template — the string form the default evaluator uses.
    #[must_use]
    pub fn to_display_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.is_finite() {
                    format!("{f:.0}")
                } else {
                    f.to_string()
                }
            }
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            Value::Array(_) | Value::Object(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }

    /// `true` if this value is an `Array`.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Borrow the inner slice if this is an `Array`.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Interpret this value as an integer for `For` bounds and similar
    /// integer-typed positions.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Look up a field by name on an `Object` value.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Build an object value from an ordered list of fields, preserving the
    /// insertion order handlers declare their outputs in.
    #[must_use]
    pub fn object(fields: Vec<(String, Value)>) -> Value {
        Value::Object(fields)
    }

    /// Type-aware, tie-broken comparison used by `If`: string
    /// comparisons are lexicographic, numeric comparisons are numeric,
    /// mixed scalar types are an error, `Bool` compares as `false < true`.
    pub fn compare(&self, other: &Value) -> Result<std::cmp::Ordering, String> {
        use std::cmp::Ordering;
        match (self, other) {
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Ok(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => {
                a.partial_cmp(b).ok_or_else(|| "NaN is not comparable".to_string())
            }
            (Value::Integer(a), Value::Float(b)) => (*a as f64)
                .partial_cmp(b)
                .ok_or_else(|| "NaN is not comparable".to_string()),
            (Value::Float(a), Value::Integer(b)) => a
                .partial_cmp(&(*b as f64))
                .ok_or_else(|| "NaN is not comparable".to_string()),
            (a, b) => Err(format!(
                "cannot compare {} with {}",
                a.type_name(),
                b.type_name()
            )),
        }
        .map(|o: Ordering| o)
    }

    /// Name of this value's runtime type, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Convert into a `BTreeMap` for deterministic diffing in tests.
    #[must_use]
    pub fn to_sorted_object(&self) -> Option<BTreeMap<String, Value>> {
        match self {
            Value::Object(fields) => Some(fields.iter().cloned().collect()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_and_float_compare_numerically() {
        assert_eq!(
            Value::Integer(5).compare(&Value::Float(3.0)).unwrap(),
            std::cmp::Ordering::Greater
        );
    }

    #[test]
    fn strings_compare_lexicographically() {
        assert_eq!(
            Value::from("a").compare(&Value::from("b")).unwrap(),
            std::cmp::Ordering::Less
        );
    }

    #[test]
    fn mixed_scalar_types_are_a_comparison_error() {
        assert!(Value::from("5").compare(&Value::Integer(5)).is_err());
    }

    #[test]
    fn display_string_renders_whole_floats_without_trailing_zero() {
        assert_eq!(Value::Float(42.0).to_display_string(), "42");
    }

    #[test]
    fn object_field_lookup() {
        let v = Value::object(vec![("x".into(), Value::Integer(42))]);
        assert_eq!(v.get_field("x"), Some(&Value::Integer(42)));
        assert_eq!(v.get_field("y"), None);
    }
}
