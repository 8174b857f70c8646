//! Tabular data: a [`ColumnSchema`] plus column-major cell storage.

use crate::error::{Error, Result};
use crate::schema::ColumnSchema;
use crate::value::CellValue;
use std::cmp::Ordering;

/// A loaded table: column schema plus one value vector per column.
///
/// Storage is column-major so whole-column access (COLUMN mode) is a slice;
/// row access goes through [`RowView`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    schema: ColumnSchema,
    columns: Vec<Vec<CellValue>>,
    row_count: usize,
}

/// A filter applied to one column of a table
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Keep rows equal to the value
    Single(CellValue),
    /// Keep rows equal to any of the values (multi-select)
    Multi(Vec<CellValue>),
    /// Keep rows within the (inclusive) bounds; missing bounds are open
    Range { min: Option<f64>, max: Option<f64> },
}

impl FilterValue {
    /// Whether the filter carries no constraint and should be skipped
    pub fn is_unset(&self) -> bool {
        match self {
            FilterValue::Single(v) => v.is_empty() || v.as_str() == Some(""),
            FilterValue::Multi(_) => false,
            FilterValue::Range { .. } => false,
        }
    }

    fn accepts(&self, value: &CellValue) -> bool {
        match self {
            FilterValue::Single(expected) => value.loosely_equals(expected),
            FilterValue::Multi(options) => options.iter().any(|o| value.loosely_equals(o)),
            FilterValue::Range { min, max } => {
                let n = match value.as_number() {
                    Some(n) => n,
                    None => return false,
                };
                min.map_or(true, |m| n >= m) && max.map_or(true, |m| n <= m)
            }
        }
    }
}

/// Summary information about a table
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableSummary {
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    pub sample_data: Vec<Vec<CellValue>>,
}

impl Table {
    /// Create an empty table with the given headers
    pub fn with_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let schema = ColumnSchema::from_headers(headers);
        let columns = vec![Vec::new(); schema.len()];
        Self {
            schema,
            columns,
            row_count: 0,
        }
    }

    /// Create a table from headers and row-major data.
    ///
    /// Short rows are padded with `Empty`; extra fields beyond the header width
    /// are dropped.
    pub fn from_rows<I, S>(headers: I, rows: Vec<Vec<CellValue>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::with_headers(headers);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Append one row of values
    pub fn push_row(&mut self, row: Vec<CellValue>) {
        let mut values = row.into_iter();
        for column in &mut self.columns {
            column.push(values.next().unwrap_or_default());
        }
        self.row_count += 1;
    }

    /// The column schema
    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column name for a letter code
    pub fn column_by_letter(&self, letter: &str) -> Option<&str> {
        self.schema.name_for(letter)
    }

    /// Letter code for a column name
    pub fn letter_by_column(&self, name: &str) -> Option<String> {
        self.schema.letter_for(name)
    }

    /// All values of a column, by name
    pub fn column_values(&self, name: &str) -> Option<&[CellValue]> {
        let index = self.schema.index_of(name)?;
        self.columns.get(index).map(Vec::as_slice)
    }

    /// Values of a column by letter, starting at a spreadsheet row number.
    ///
    /// Row 1 is the header, so `start_row` 0, 1 and 2 all return every data row;
    /// 3 skips the first data row, and so on. Unknown letters give an empty list.
    pub fn column_data(&self, letter: &str, start_row: usize) -> Vec<CellValue> {
        let name = match self.schema.name_for(letter) {
            Some(name) => name,
            None => return Vec::new(),
        };
        let values = self.column_values(name).unwrap_or(&[]);
        let skip = data_offset(start_row).min(values.len());
        values[skip..].to_vec()
    }

    /// Distinct non-empty values of a column (by letter), sorted
    pub fn unique_values(&self, letter: &str) -> Vec<CellValue> {
        let mut unique: Vec<CellValue> = Vec::new();
        for value in self.column_data(letter, 0) {
            if value.is_empty() || unique.contains(&value) {
                continue;
            }
            unique.push(value);
        }
        unique.sort_by(compare_cells);
        unique
    }

    /// View of a single row
    pub fn row(&self, index: usize) -> Option<RowView<'_>> {
        if index < self.row_count {
            Some(RowView { table: self, index })
        } else {
            None
        }
    }

    /// Iterate over all rows
    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> + '_ {
        (0..self.row_count).map(move |index| RowView { table: self, index })
    }

    /// Append a derived column and register it in the schema.
    ///
    /// The values must already be computed; the schema is extended only after
    /// they are stored. Adding an existing name replaces that column's values.
    pub fn add_column<S: Into<String>>(&mut self, name: S, values: Vec<CellValue>) -> Result<String> {
        let name = name.into();
        if values.len() != self.row_count {
            return Err(Error::ColumnLength {
                column: name,
                expected: self.row_count,
                actual: values.len(),
            });
        }

        if let Some(index) = self.schema.index_of(&name) {
            self.columns[index] = values;
            return Ok(ColumnSchema::column_to_letters(index));
        }

        self.columns.push(values);
        Ok(self.schema.add_column(name))
    }

    /// New table holding only the rows for which `keep` returns true
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&RowView<'_>) -> bool,
    {
        let indices: Vec<usize> = self.rows().filter(|row| keep(row)).map(|r| r.index).collect();
        self.select_rows(&indices)
    }

    /// New table holding the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                indices
                    .iter()
                    .filter_map(|&i| column.get(i).cloned())
                    .collect()
            })
            .collect();
        Table {
            schema: self.schema.clone(),
            columns,
            row_count: indices.iter().filter(|&&i| i < self.row_count).count(),
        }
    }

    /// Apply dashboard filters and return the matching rows.
    ///
    /// Filter names match column names case-insensitively. Unset filters and
    /// filters naming unknown columns are ignored.
    pub fn apply_filters(&self, filters: &[(String, FilterValue)]) -> Table {
        let mut active: Vec<(usize, &FilterValue)> = Vec::new();
        for (name, filter) in filters {
            if filter.is_unset() {
                continue;
            }
            let column = self
                .schema
                .names()
                .iter()
                .position(|col| col.eq_ignore_ascii_case(name));
            if let Some(index) = column {
                active.push((index, filter));
            }
        }

        self.filter_rows(|row| {
            active
                .iter()
                .all(|(col, filter)| filter.accepts(&row.table.columns[*col][row.index]))
        })
    }

    /// Row/column counts, column names and the first three rows
    pub fn summary(&self) -> TableSummary {
        TableSummary {
            rows: self.row_count,
            columns: self.columns.len(),
            column_names: self.schema.names().to_vec(),
            sample_data: self
                .rows()
                .take(3)
                .map(|row| row.values().cloned().collect())
                .collect(),
        }
    }

    /// Rows as JSON records (`[{"name": value, ...}, ...]`), missing values as `""`
    #[cfg(feature = "serde")]
    pub fn to_json_records(&self) -> serde_json::Value {
        let records = self
            .rows()
            .map(|row| {
                let mut record = serde_json::Map::new();
                for (name, value) in row.iter() {
                    let json = if value.is_empty() {
                        serde_json::Value::String(String::new())
                    } else {
                        serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
                    };
                    record.insert(name.to_string(), json);
                }
                serde_json::Value::Object(record)
            })
            .collect();
        serde_json::Value::Array(records)
    }
}

/// Convert a spreadsheet row number (header = row 1) to a data row offset
pub fn data_offset(start_row: usize) -> usize {
    start_row.saturating_sub(2)
}

/// Total order used for sorting cell values: empty, booleans, numbers, strings
pub fn compare_cells(a: &CellValue, b: &CellValue) -> Ordering {
    fn rank(v: &CellValue) -> u8 {
        match v {
            CellValue::Empty => 0,
            CellValue::Boolean(_) => 1,
            CellValue::Number(_) => 2,
            CellValue::String(_) => 3,
        }
    }

    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (CellValue::String(x), CellValue::String(y)) => x.cmp(y),
        (CellValue::Boolean(x), CellValue::Boolean(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Borrowed view of one table row
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> RowView<'a> {
    /// Zero-based data row index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Value of a column by name
    pub fn get(&self, name: &str) -> Option<&'a CellValue> {
        let col = self.table.schema.index_of(name)?;
        self.table.columns.get(col).and_then(|c| c.get(self.index))
    }

    /// Value of a column by letter code
    pub fn get_by_letter(&self, letter: &str) -> Option<&'a CellValue> {
        let name = self.table.schema.name_for(letter)?;
        self.get(name)
    }

    /// Values in column order
    pub fn values(&self) -> impl Iterator<Item = &'a CellValue> + 'a {
        let index = self.index;
        self.table.columns.iter().map(move |c| &c[index])
    }

    /// `(name, value)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a CellValue)> + 'a {
        self.table
            .schema
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values())
    }

    /// The schema of the owning table
    pub fn schema(&self) -> &'a ColumnSchema {
        &self.table.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Table {
        Table::from_rows(
            ["region", "sales"],
            vec![
                vec!["east".into(), 100.into()],
                vec!["west".into(), 200.into()],
                vec!["east".into(), 50.into()],
            ],
        )
    }

    #[test]
    fn test_row_access() {
        let table = sample();
        assert_eq!(table.row_count(), 3);
        let row = table.row(1).unwrap();
        assert_eq!(row.get("region"), Some(&CellValue::string("west")));
        assert_eq!(row.get_by_letter("B"), Some(&CellValue::Number(200.0)));
        assert!(table.row(3).is_none());
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = Table::from_rows(["a", "b"], vec![vec![1.into()]]);
        assert_eq!(table.row(0).unwrap().get("b"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_column_data_start_row() {
        let table = sample();
        assert_eq!(table.column_data("B", 1).len(), 3);
        assert_eq!(table.column_data("B", 2).len(), 3);
        assert_eq!(
            table.column_data("B", 3),
            vec![CellValue::Number(200.0), CellValue::Number(50.0)]
        );
        assert!(table.column_data("Z", 2).is_empty());
    }

    #[test]
    fn test_unique_values_sorted() {
        let table = sample();
        assert_eq!(
            table.unique_values("A"),
            vec![CellValue::string("east"), CellValue::string("west")]
        );
        assert_eq!(
            table.unique_values("B"),
            vec![
                CellValue::Number(50.0),
                CellValue::Number(100.0),
                CellValue::Number(200.0)
            ]
        );
    }

    #[test]
    fn test_add_column() {
        let mut table = sample();
        let letter = table
            .add_column("double", vec![200.into(), 400.into(), 100.into()])
            .unwrap();
        assert_eq!(letter, "C");
        assert_eq!(table.column_by_letter("C"), Some("double"));

        let err = table.add_column("bad", vec![1.into()]).unwrap_err();
        assert!(matches!(err, Error::ColumnLength { expected: 3, actual: 1, .. }));
    }

    #[test]
    fn test_apply_filters() {
        let table = sample();

        let single = table.apply_filters(&[("Region".into(), FilterValue::Single("east".into()))]);
        assert_eq!(single.row_count(), 2);

        let multi = table.apply_filters(&[(
            "region".into(),
            FilterValue::Multi(vec!["west".into(), "north".into()]),
        )]);
        assert_eq!(multi.row_count(), 1);

        let range = table.apply_filters(&[(
            "sales".into(),
            FilterValue::Range {
                min: Some(60.0),
                max: Some(150.0),
            },
        )]);
        assert_eq!(range.row_count(), 1);

        let ignored = table.apply_filters(&[
            ("region".into(), FilterValue::Single("".into())),
            ("unknown".into(), FilterValue::Single("x".into())),
        ]);
        assert_eq!(ignored.row_count(), 3);
    }

    #[test]
    fn test_summary() {
        let summary = sample().summary();
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.columns, 2);
        assert_eq!(summary.column_names, vec!["region", "sales"]);
        assert_eq!(summary.sample_data.len(), 3);
    }
}
