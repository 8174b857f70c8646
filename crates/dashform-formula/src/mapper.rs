//! Function mapping: Excel function names to column-mode runtime names

use crate::splitter::map_unquoted;
use ahash::AHashMap;
use lazy_regex::regex;
use regex::Captures;

/// The built-in Excel -> runtime function table
const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    // Aggregates
    ("SUM", "arraySum"),
    ("AVG", "arrayAvg"),
    ("AVERAGE", "arrayAvg"),
    ("COUNT", "arrayCount"),
    ("COUNTA", "arrayCountA"),
    ("MAX", "arrayMax"),
    ("MIN", "arrayMin"),
    // Conditional aggregates
    ("SUMIF", "arraySumIf"),
    ("COUNTIF", "arrayCountIf"),
    ("COUNTIFS", "arrayCountIfs"),
    ("UNIQUE", "arrayUnique"),
    // Logical
    ("IF", "excelIf"),
    ("AND", "excelAnd"),
    ("OR", "excelOr"),
    // Math
    ("ROUND", "Math.round"),
    ("ABS", "Math.abs"),
    ("INT", "Math.floor"),
    // Dates and times
    ("MONTH", "getMonth"),
    ("YEAR", "arrayMapYear"),
    ("TODAY", "excelToday"),
    ("TIME", "excelTime"),
    ("HOUR", "excelHour"),
    ("TIMEVALUE", "excelTimeValue"),
    // Lookup
    ("INDEX", "arrayIndex"),
    ("MATCH", "arrayMatch"),
    ("CHOOSE", "excelChoose"),
    // Text
    ("LEFT", "excelLeft"),
    ("RIGHT", "excelRight"),
    ("MID", "excelMid"),
    ("VALUE", "parseFloat"),
    ("ISNUMBER", "excelIsNumber"),
    ("SEARCH", "excelSearch"),
    ("TEXT", "excelText"),
];

/// Immutable Excel-name -> target-name table.
///
/// Owned by a [`FormulaTranslator`](crate::FormulaTranslator); the default
/// table holds the built-in mappings, alternates can be built with
/// [`FunctionTable::from_pairs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionTable {
    /// Uppercase Excel name -> target name
    mappings: AHashMap<String, String>,
}

impl FunctionTable {
    /// Build a table from `(excel_name, target_name)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mappings = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_uppercase(), v.into()))
            .collect();
        Self { mappings }
    }

    /// Target name for an Excel function (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.mappings.get(&name.to_uppercase()).map(String::as_str)
    }

    /// Number of mappings
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Iterate `(excel_name, target_name)` pairs, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mappings.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replace every mapped `NAME(` call in `expr` with its target name.
    ///
    /// Arguments are left untouched, as is anything inside quoted literals and
    /// member names such as the `round` in `Math.round(`.
    pub fn apply(&self, expr: &str) -> String {
        let re = regex!(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(");

        map_unquoted(expr, |segment| {
            re.replace_all(segment, |caps: &Captures<'_>| {
                let name = &caps[1];
                let is_member = caps
                    .get(0)
                    .map_or(false, |m| segment[..m.start()].ends_with('.'));
                match self.get(name) {
                    Some(target) if !is_member => format!("{}(", target),
                    _ => caps[0].to_string(),
                }
            })
            .into_owned()
        })
    }
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_MAPPINGS.iter().copied())
    }
}
