//! Cell value types

use std::fmt;

/// Represents a single value in a table column
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Missing value
    #[default]
    Empty,

    /// Boolean value
    Boolean(bool),

    /// Numeric value (all numbers stored as f64)
    Number(f64),

    /// String value
    String(String),
}

impl CellValue {
    /// Create a new string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        CellValue::String(s.into())
    }

    /// Detect the type of a raw text field
    ///
    /// Empty -> `Empty`, `true`/`false` (any case) -> `Boolean`,
    /// parseable float -> `Number`, anything else -> `String`.
    pub fn detect(field: &str) -> Self {
        let field = field.trim();

        if field.is_empty() {
            return CellValue::Empty;
        }

        match field.to_lowercase().as_str() {
            "true" => return CellValue::Boolean(true),
            "false" => return CellValue::Boolean(false),
            _ => {}
        }

        if let Ok(n) = field.parse::<f64>() {
            if !n.is_nan() {
                return CellValue::Number(n);
            }
        }

        CellValue::string(field)
    }

    /// Check if the value is missing (empty, or a NaN number)
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Boolean(true) => Some(1.0),
            CellValue::Boolean(false) => Some(0.0),
            CellValue::String(s) => s.trim().parse().ok(),
            CellValue::Empty => None,
        }
    }

    /// Try to get the value as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Type name, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Boolean(_) => "boolean",
            CellValue::Number(_) => "number",
            CellValue::String(_) => "string",
        }
    }

    /// Equality used by filters: numbers compare numerically even when one
    /// side is numeric text, strings compare exactly.
    pub fn loosely_equals(&self, other: &CellValue) -> bool {
        match (self, other) {
            (CellValue::Empty, CellValue::Empty) => true,
            (CellValue::Boolean(a), CellValue::Boolean(b)) => a == b,
            (CellValue::String(a), CellValue::String(b)) => a == b,
            (CellValue::Number(a), CellValue::Number(b)) => a == b,
            (CellValue::Number(_), CellValue::String(_))
            | (CellValue::String(_), CellValue::Number(_)) => {
                match (self.as_number(), other.as_number()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

/// Format a number the way the dashboards display raw values: integral values
/// without a fractional part, everything else with Rust's shortest round-trip form.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => write!(f, "{}", format_number(*n)),
            CellValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::string(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for CellValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_none(),
            CellValue::Boolean(b) => serializer.serialize_bool(*b),
            CellValue::Number(n) if n.is_nan() => serializer.serialize_none(),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::String(s) => serializer.serialize_str(s),
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for CellValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::Null => CellValue::Empty,
            serde_json::Value::Bool(b) => CellValue::Boolean(b),
            serde_json::Value::Number(n) => CellValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => CellValue::String(s),
            other => CellValue::String(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(CellValue::detect(""), CellValue::Empty);
        assert_eq!(CellValue::detect("  "), CellValue::Empty);
        assert_eq!(CellValue::detect("TRUE"), CellValue::Boolean(true));
        assert_eq!(CellValue::detect("false"), CellValue::Boolean(false));
        assert_eq!(CellValue::detect("42"), CellValue::Number(42.0));
        assert_eq!(CellValue::detect("-3.5"), CellValue::Number(-3.5));
        assert_eq!(CellValue::detect("east"), CellValue::string("east"));
        assert_eq!(CellValue::detect("2024-03-15"), CellValue::string("2024-03-15"));
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Number(100.0).to_string(), "100");
        assert_eq!(CellValue::Number(1.5).to_string(), "1.5");
        assert_eq!(CellValue::Boolean(true).to_string(), "TRUE");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn test_loosely_equals() {
        assert!(CellValue::Number(5.0).loosely_equals(&CellValue::string("5")));
        assert!(!CellValue::string("east").loosely_equals(&CellValue::string("East")));
        assert!(!CellValue::Boolean(true).loosely_equals(&CellValue::Number(1.0)));
    }

    #[test]
    fn test_nan_is_empty() {
        assert!(CellValue::Number(f64::NAN).is_empty());
        assert!(!CellValue::Number(0.0).is_empty());
    }
}
