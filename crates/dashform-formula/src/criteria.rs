//! Criteria matching for SUMIF, COUNTIF and COUNTIFS
//!
//! A criterion can be:
//! - A number: numeric equality (e.g., 5)
//! - A comparison expression: operator prefix then value, ">5", ">=10",
//!   "<100", "<=50", "!=0", "=east"; the value is numeric when it parses as a
//!   number, text otherwise
//! - `true` / `false`: boolean equality, never numeric coercion
//! - Plain text: case-insensitive match, `*` and `?` wildcards
//! - Empty string: matches empty values

use crate::runtime::ScriptValue;
use lazy_regex::regex_captures;
use std::cmp::Ordering;
use std::fmt;

/// Comparison operators shared by criteria and default filter conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl ComparisonOp {
    /// Parse an operator; `==` and `<>` are accepted as spellings of `=` and `!=`
    pub fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "=" | "==" => ComparisonOp::Equal,
            "!=" | "<>" => ComparisonOp::NotEqual,
            "<" => ComparisonOp::LessThan,
            "<=" => ComparisonOp::LessEqual,
            ">" => ComparisonOp::GreaterThan,
            ">=" => ComparisonOp::GreaterEqual,
            _ => return None,
        })
    }

    /// Canonical spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterEqual => ">=",
        }
    }

    /// Whether an ordering between value and operand satisfies the operator
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonOp::Equal => ordering == Ordering::Equal,
            ComparisonOp::NotEqual => ordering != Ordering::Equal,
            ComparisonOp::LessThan => ordering == Ordering::Less,
            ComparisonOp::LessEqual => ordering != Ordering::Greater,
            ComparisonOp::GreaterThan => ordering == Ordering::Greater,
            ComparisonOp::GreaterEqual => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    Number(f64),
    Boolean(bool),
    Text(String),
}

impl Operand {
    /// Number if it parses, boolean for `true`/`false`, text otherwise
    pub(crate) fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.eq_ignore_ascii_case("true") {
            Operand::Boolean(true)
        } else if text.eq_ignore_ascii_case("false") {
            Operand::Boolean(false)
        } else if let Ok(n) = text.parse::<f64>() {
            Operand::Number(n)
        } else {
            Operand::Text(text.to_string())
        }
    }

    /// Compare `value` against this operand with `op`
    pub(crate) fn compare(&self, op: ComparisonOp, value: &ScriptValue) -> bool {
        match self {
            Operand::Number(n) => match value.as_number() {
                Some(v) if !v.is_nan() => op.accepts(v.partial_cmp(n).unwrap_or(Ordering::Less)),
                _ => op == ComparisonOp::NotEqual,
            },
            Operand::Boolean(b) => {
                let actual = match value {
                    ScriptValue::Boolean(v) => Some(*v),
                    ScriptValue::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
                    ScriptValue::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
                    _ => None,
                };
                match (op, actual) {
                    (ComparisonOp::Equal, Some(v)) => v == *b,
                    (ComparisonOp::NotEqual, Some(v)) => v != *b,
                    (ComparisonOp::NotEqual, None) => true,
                    _ => false,
                }
            }
            Operand::Text(t) => {
                if value.is_null_like() {
                    return op == ComparisonOp::NotEqual;
                }
                let actual = value.as_string().to_lowercase();
                op.accepts(actual.cmp(&t.to_lowercase()))
            }
        }
    }
}

/// Criteria matcher for the conditional aggregates
#[derive(Debug)]
pub struct CriteriaMatcher {
    criteria_type: CriteriaType,
}

#[derive(Debug)]
enum CriteriaType {
    /// Exact number match
    Number(f64),
    /// Boolean match
    Boolean(bool),
    /// Operator prefix with a value
    Comparison(ComparisonOp, Operand),
    /// Text match (case-insensitive, with wildcards)
    Text(String),
    /// Match empty values
    Empty,
}

impl CriteriaMatcher {
    /// Create a new criteria matcher from a runtime value
    pub fn new(criteria: &ScriptValue) -> Self {
        let criteria_type = match criteria {
            ScriptValue::Number(n) => CriteriaType::Number(*n),
            ScriptValue::Boolean(b) => CriteriaType::Boolean(*b),
            ScriptValue::String(s) => Self::parse_string_criteria(s),
            ScriptValue::Null => CriteriaType::Empty,
            // Arrays as criteria are not supported
            ScriptValue::Array(_) => CriteriaType::Empty,
        };

        Self { criteria_type }
    }

    fn parse_string_criteria(s: &str) -> CriteriaType {
        let s = s.trim();

        if s.is_empty() {
            return CriteriaType::Empty;
        }

        if let Some((_, op, rest)) = regex_captures!(r"^([><=!]+)(.*)$", s) {
            if let Some(op) = ComparisonOp::parse(op) {
                return CriteriaType::Comparison(op, Operand::parse(rest));
            }
        }

        match Operand::parse(s) {
            Operand::Number(n) => CriteriaType::Number(n),
            Operand::Boolean(b) => CriteriaType::Boolean(b),
            Operand::Text(t) => CriteriaType::Text(t.to_lowercase()),
        }
    }

    /// Check if a value matches the criteria
    pub fn matches(&self, value: &ScriptValue) -> bool {
        match &self.criteria_type {
            CriteriaType::Number(n) => Operand::Number(*n).compare(ComparisonOp::Equal, value),
            CriteriaType::Boolean(b) => Operand::Boolean(*b).compare(ComparisonOp::Equal, value),
            CriteriaType::Comparison(op, operand) => operand.compare(*op, value),
            CriteriaType::Text(pattern) => {
                let text = value.as_string().to_lowercase();
                Self::wildcard_match(pattern, &text)
            }
            CriteriaType::Empty => value.is_null_like(),
        }
    }

    /// Match with wildcards: * = any characters, ? = single character
    fn wildcard_match(pattern: &str, text: &str) -> bool {
        if !pattern.contains('*') && !pattern.contains('?') {
            return pattern == text;
        }

        let pattern_chars: Vec<char> = pattern.chars().collect();
        let text_chars: Vec<char> = text.chars().collect();

        Self::wildcard_match_impl(&pattern_chars, &text_chars)
    }

    fn wildcard_match_impl(pattern: &[char], text: &[char]) -> bool {
        let mut pi = 0; // pattern index
        let mut ti = 0; // text index
        let mut star_pi = None; // position of last * in pattern
        let mut star_ti = 0; // position in text when we matched last *

        while ti < text.len() {
            if pi < pattern.len() && (pattern[pi] == '?' || pattern[pi] == text[ti]) {
                pi += 1;
                ti += 1;
            } else if pi < pattern.len() && pattern[pi] == '*' {
                star_pi = Some(pi);
                star_ti = ti;
                pi += 1;
            } else if let Some(sp) = star_pi {
                pi = sp + 1;
                star_ti += 1;
                ti = star_ti;
            } else {
                return false;
            }
        }

        while pi < pattern.len() && pattern[pi] == '*' {
            pi += 1;
        }

        pi == pattern.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> ScriptValue {
        ScriptValue::String(text.into())
    }

    #[test]
    fn test_number_criteria() {
        let matcher = CriteriaMatcher::new(&ScriptValue::Number(5.0));
        assert!(matcher.matches(&ScriptValue::Number(5.0)));
        assert!(!matcher.matches(&ScriptValue::Number(4.0)));
        assert!(matcher.matches(&s("5")));
    }

    #[test]
    fn test_comparison_criteria() {
        let matcher = CriteriaMatcher::new(&s(">5"));
        assert!(matcher.matches(&ScriptValue::Number(6.0)));
        assert!(!matcher.matches(&ScriptValue::Number(5.0)));

        let matcher = CriteriaMatcher::new(&s(">=5"));
        assert!(matcher.matches(&ScriptValue::Number(5.0)));
        assert!(!matcher.matches(&ScriptValue::Number(4.0)));

        let matcher = CriteriaMatcher::new(&s("<5"));
        assert!(matcher.matches(&ScriptValue::Number(4.0)));
        assert!(!matcher.matches(&ScriptValue::Number(5.0)));

        let matcher = CriteriaMatcher::new(&s("<=5"));
        assert!(matcher.matches(&ScriptValue::Number(5.0)));
        assert!(!matcher.matches(&ScriptValue::Number(6.0)));

        let matcher = CriteriaMatcher::new(&s("!=5"));
        assert!(matcher.matches(&ScriptValue::Number(6.0)));
        assert!(!matcher.matches(&ScriptValue::Number(5.0)));
        assert!(matcher.matches(&s("text")));

        let matcher = CriteriaMatcher::new(&s("=5"));
        assert!(matcher.matches(&ScriptValue::Number(5.0)));
        assert!(!matcher.matches(&ScriptValue::Number(6.0)));
    }

    #[test]
    fn test_text_comparison_criteria() {
        let matcher = CriteriaMatcher::new(&s("=east"));
        assert!(matcher.matches(&s("East")));
        assert!(!matcher.matches(&s("west")));

        let matcher = CriteriaMatcher::new(&s("!=east"));
        assert!(matcher.matches(&s("west")));
        assert!(!matcher.matches(&s("east")));
    }

    #[test]
    fn test_boolean_criteria() {
        let matcher = CriteriaMatcher::new(&s("=true"));
        assert!(matcher.matches(&ScriptValue::Boolean(true)));
        assert!(!matcher.matches(&ScriptValue::Boolean(false)));
        // No numeric coercion for booleans
        assert!(!matcher.matches(&ScriptValue::Number(1.0)));

        let matcher = CriteriaMatcher::new(&s("false"));
        assert!(matcher.matches(&ScriptValue::Boolean(false)));
        assert!(matcher.matches(&s("FALSE")));
    }

    #[test]
    fn test_text_criteria() {
        let matcher = CriteriaMatcher::new(&s("apple"));
        assert!(matcher.matches(&s("APPLE")));
        assert!(!matcher.matches(&s("banana")));
    }

    #[test]
    fn test_wildcard_criteria() {
        let matcher = CriteriaMatcher::new(&s("a*e"));
        assert!(matcher.matches(&s("apple")));
        assert!(matcher.matches(&s("ae")));
        assert!(!matcher.matches(&s("apples")));

        let matcher = CriteriaMatcher::new(&s("a?ple"));
        assert!(matcher.matches(&s("apple")));
        assert!(!matcher.matches(&s("aple")));
    }

    #[test]
    fn test_empty_criteria() {
        let matcher = CriteriaMatcher::new(&s(""));
        assert!(matcher.matches(&ScriptValue::Null));
        assert!(matcher.matches(&s("")));
        assert!(!matcher.matches(&s("text")));
        assert!(!matcher.matches(&ScriptValue::Number(0.0)));
    }
}
