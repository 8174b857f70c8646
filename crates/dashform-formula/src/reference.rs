//! Reference resolution: Excel-style references rewritten against a column
//! schema, either to literal values of the current row (ROW mode) or to data
//! accessor calls over whole columns (COLUMN mode).
//!
//! Four reference shapes are recognised, most specific first:
//!
//! 1. named-column ranges, `survival_rate2:survival_rate`
//! 2. same-column letter ranges, `B2:B`, `C:C`
//! 3. single cells, `A1`
//! 4. bare column names, `region`
//!
//! Every pass works on unquoted text only. Accessor calls emitted by an
//! earlier pass carry their column name as a quoted literal, so later passes
//! never wrap them a second time.

use crate::splitter::map_unquoted;
use dashform_core::{CellValue, ColumnSchema, RowView};
use lazy_regex::regex;
use regex::{Captures, Regex};

/// Evaluation mode of a translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    /// A reference means the value in the current row
    Row,
    /// A reference means all values of a column
    Column,
}

/// What references resolve against
#[derive(Debug, Clone, Copy)]
pub enum ResolveContext<'a> {
    /// The current row; references become literal values
    Row(RowView<'a>),
    /// The table schema; references become accessor calls
    Column(&'a ColumnSchema),
}

impl<'a> ResolveContext<'a> {
    /// The evaluation mode this context resolves for
    pub fn mode(&self) -> EvaluationMode {
        match self {
            ResolveContext::Row(_) => EvaluationMode::Row,
            ResolveContext::Column(_) => EvaluationMode::Column,
        }
    }

    /// The schema references are looked up in
    pub fn schema(&self) -> &'a ColumnSchema {
        match self {
            ResolveContext::Row(row) => row.schema(),
            ResolveContext::Column(schema) => schema,
        }
    }

    /// Expression for a whole column referenced by name
    fn column(&self, name: &str, start_row: Option<&str>) -> String {
        match self {
            ResolveContext::Row(row) => match row.get(name) {
                Some(value) => row_literal(value),
                None => quote(name),
            },
            ResolveContext::Column(_) => match start_row {
                Some(start) => format!("getColumnData({}, {})", quote(name), start),
                None => format!("getColumnData({})", quote(name)),
            },
        }
    }
}

/// Words the row-mode dialect reserves; never treated as column names
const RESERVED: &[&str] = &[
    "if", "else", "and", "or", "not", "True", "False", "None", "true", "false", "null", "TRUE",
    "FALSE",
];

/// Quote text as a double-quoted script string literal
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Literal for a row value: missing and NaN become `0`, text is quoted
pub fn row_literal(value: &CellValue) -> String {
    match value {
        v if v.is_empty() => "0".to_string(),
        CellValue::Number(n) => dashform_core::format_number(*n),
        CellValue::Boolean(true) => "True".to_string(),
        CellValue::Boolean(false) => "False".to_string(),
        CellValue::String(s) => quote(s),
        CellValue::Empty => "0".to_string(),
    }
}

/// Run `replace` over every match of `re`, keeping the matched text when it
/// returns `None`. Matches directly followed by `(` (a call such as `LOG10(`)
/// or directly preceded by `.` (a member such as `Math.round`) are skipped.
fn rewrite_matches<F>(text: &str, re: &Regex, mut replace: F) -> String
where
    F: FnMut(&Captures<'_>) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };

        let is_call = text[whole.end()..].trim_start().starts_with('(');
        let is_member = text[..whole.start()].ends_with('.');
        if is_call || is_member {
            continue;
        }

        if let Some(replacement) = replace(&caps) {
            out.push_str(&text[last..whole.start()]);
            out.push_str(&replacement);
            last = whole.end();
        }
    }

    out.push_str(&text[last..]);
    out
}

fn is_letter_ref(text: &str) -> bool {
    regex!(r"^[A-Z]+\d*$").is_match(text)
}

/// Column named by letter-shaped text: the lettered column, else a column
/// whose header is exactly those letters (`ID`, `SKU`)
fn letter_column<'s>(schema: &'s ColumnSchema, letters: &'s str) -> Option<&'s str> {
    schema
        .name_for(letters)
        .or_else(|| schema.contains(letters).then_some(letters))
}

fn replace_named_ranges(text: &str, ctx: &ResolveContext<'_>) -> String {
    let re = regex!(r"\b([A-Za-z_][A-Za-z0-9_]+):([A-Za-z_][A-Za-z0-9_]+)\b");

    rewrite_matches(text, re, |caps| {
        let start = &caps[1];
        let end = &caps[2];

        if !(start.starts_with(end) || end.starts_with(start)) {
            return None;
        }
        let base = if end.len() <= start.len() { end } else { start };

        // `AA2:AA` belongs to the letter-range pass unless a header is spelled that way
        if is_letter_ref(start) && is_letter_ref(end) && !ctx.schema().contains(base) {
            return None;
        }
        Some(ctx.column(base, None))
    })
}

fn replace_letter_ranges(text: &str, ctx: &ResolveContext<'_>) -> String {
    let re = regex!(r"\b([A-Z]+)(\d*):([A-Z]+)(\d*)\b");
    let schema = ctx.schema();

    rewrite_matches(text, re, |caps| {
        let start_col = &caps[1];
        let start_row = &caps[2];
        if start_col != &caps[3] {
            return None;
        }

        let start = if start_row.is_empty() || start_row == "1" {
            None
        } else {
            Some(start_row)
        };

        Some(match (ctx, letter_column(schema, start_col)) {
            (ResolveContext::Row(_), None) => quote(start_col),
            (_, Some(name)) => ctx.column(name, start),
            (ResolveContext::Column(_), None) => ctx.column(start_col, start),
        })
    })
}

fn replace_cells(text: &str, ctx: &ResolveContext<'_>) -> String {
    let re = regex!(r"\b([A-Z]+)(\d+)\b");
    let schema = ctx.schema();

    rewrite_matches(text, re, |caps| {
        // Endpoints of a range the range passes could not resolve stay as-is
        let whole = caps.get(0)?;
        if text[whole.end()..].starts_with(':') || text[..whole.start()].ends_with(':') {
            return None;
        }

        let col = &caps[1];
        let name = letter_column(schema, col);

        match ctx {
            // The row number is an authoring artifact: always the current row
            ResolveContext::Row(row) => Some(match name.and_then(|n| row.get(n)) {
                Some(value) => row_literal(value),
                None => quote(col),
            }),
            ResolveContext::Column(_) => {
                let row: i64 = caps[2].parse().ok()?;
                Some(format!(
                    "getCellValue({}, {})",
                    quote(name.unwrap_or(col)),
                    row - 1
                ))
            }
        }
    })
}

fn replace_column_names(text: &str, ctx: &ResolveContext<'_>) -> String {
    let mut names: Vec<&str> = ctx
        .schema()
        .names()
        .iter()
        .map(String::as_str)
        .filter(|name| is_plain_name(name))
        .collect();
    // Longer names first so "Sales Amount" wins over "Sales"
    names.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut text = text.to_string();
    for name in names {
        let re = match Regex::new(&format!(r"\b{}\b", regex::escape(name))) {
            Ok(re) => re,
            Err(e) => {
                log::debug!("skipping column name {:?}: {}", name, e);
                continue;
            }
        };
        text = map_unquoted(&text, |segment| {
            rewrite_matches(segment, &re, |_| Some(ctx.column(name, None)))
        });
    }
    text
}

/// Names the bare-name pass can match as whole words
fn is_plain_name(name: &str) -> bool {
    let word = |c: char| c.is_alphanumeric() || c == '_';
    match (name.chars().next(), name.chars().last()) {
        (Some(first), Some(last)) => {
            word(first)
                && word(last)
                && !name.chars().all(|c| c.is_ascii_digit() || c == '.')
                && !RESERVED.contains(&name)
        }
        _ => false,
    }
}

/// Resolve all references in `expr` against `ctx`.
///
/// ```rust
/// use dashform_core::ColumnSchema;
/// use dashform_formula::{resolve_references, ResolveContext};
///
/// let schema = ColumnSchema::from_headers(["region", "sales"]);
/// let ctx = ResolveContext::Column(&schema);
/// assert_eq!(resolve_references("SUM(B2:B)", &ctx), r#"SUM(getColumnData("sales", 2))"#);
/// ```
pub fn resolve_references(expr: &str, ctx: &ResolveContext<'_>) -> String {
    let text = map_unquoted(expr, |s| replace_named_ranges(s, ctx));
    let text = map_unquoted(&text, |s| replace_letter_ranges(s, ctx));
    let text = map_unquoted(&text, |s| replace_cells(s, ctx));
    replace_column_names(&text, ctx)
}

/// Rewrite the average-percentage-growth idiom `AVERAGE(((X-Y)/Y)*100)` over
/// two column ranges into a single vectorised helper call.
///
/// Runs before generic resolution. Occurrences naming an unknown column are
/// left for the generic passes.
pub fn rewrite_growth_pattern(expr: &str, schema: &ColumnSchema) -> String {
    let re = regex!(
        r"(?i:AVERAGE)\(\s*\(\s*\(\s*([A-Z]+\d*:\d*[A-Z]*)\s*-\s*([A-Z]+\d*:\d*[A-Z]*)\s*\)\s*/\s*([A-Z]+\d*:\d*[A-Z]*)\s*\)\s*\*\s*100\s*\)"
    );
    let letters = regex!(r"^[A-Z]+");

    map_unquoted(expr, |segment| {
        re.replace_all(segment, |caps: &Captures<'_>| {
            let current = letters.find(&caps[1]).map(|m| m.as_str());
            let previous = letters.find(&caps[2]).map(|m| m.as_str());
            match (
                current.and_then(|l| schema.name_for(l)),
                previous.and_then(|l| schema.name_for(l)),
            ) {
                (Some(current), Some(previous)) => format!(
                    "arrayAvg(arrayPercentageGrowth(getColumnData({}, 2), getColumnData({}, 2)))",
                    quote(current),
                    quote(previous)
                ),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
    })
}
