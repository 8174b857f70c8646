//! Column schema: the bidirectional mapping between spreadsheet column letters
//! ("A", "B", ..., "Z", "AA", ...) and the column names of a loaded table.

use ahash::AHashMap;
use std::fmt;

/// Letter <-> name mapping for the columns of a table.
///
/// Letters are derived from the column position, so the mapping is a bijection
/// as long as column names are unique. Names are deduplicated on construction
/// (`x`, `x.1`, `x.2`, ...). The schema only ever grows: derived columns are
/// appended with [`ColumnSchema::add_column`] and receive the next free letter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSchema {
    /// Column names in position order (index 0 = "A")
    names: Vec<String>,
    /// Column name -> position
    by_name: AHashMap<String, usize>,
}

impl ColumnSchema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema from table headers, in order
    pub fn from_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut schema = Self::new();
        for header in headers {
            let header = header.into();
            let name = schema.unique_name(&header);
            schema.push(name);
        }
        schema
    }

    /// Convert a zero-based column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
    pub fn column_to_letters(index: usize) -> String {
        let mut letters = Vec::new();
        let mut n = index as i64;

        while n >= 0 {
            letters.push((b'A' + (n % 26) as u8) as char);
            n = n / 26 - 1;
        }

        letters.iter().rev().collect()
    }

    /// Convert column letters to a zero-based index (A = 0, Z = 25, AA = 26, etc.)
    ///
    /// Returns `None` for empty input or anything that is not ASCII letters.
    pub fn letters_to_column(letters: &str) -> Option<usize> {
        if letters.is_empty() {
            return None;
        }

        let mut col: usize = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return None;
            }
            col = col
                .checked_mul(26)?
                .checked_add(c.to_ascii_uppercase() as usize - 'A' as usize + 1)?;
        }

        Some(col - 1)
    }

    /// Column name for a letter code, if the column exists
    pub fn name_for(&self, letter: &str) -> Option<&str> {
        let index = Self::letters_to_column(letter)?;
        self.names.get(index).map(String::as_str)
    }

    /// Letter code for a column name, if the column exists
    pub fn letter_for(&self, name: &str) -> Option<String> {
        self.by_name.get(name).map(|&i| Self::column_to_letters(i))
    }

    /// Position of a column by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Whether a column with this exact name exists
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Append a derived column and return the letter assigned to it.
    ///
    /// The letter is computed from the current width, so this must run once per
    /// derived column, after its values exist. Registering an existing name
    /// returns that column's letter and leaves the schema unchanged.
    pub fn add_column<S: Into<String>>(&mut self, name: S) -> String {
        let name = name.into();
        if let Some(&index) = self.by_name.get(&name) {
            return Self::column_to_letters(index);
        }
        let letter = Self::column_to_letters(self.names.len());
        self.push(name);
        letter
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Column names in position order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterate `(letter, name)` pairs in position order
    pub fn iter(&self) -> impl Iterator<Item = (String, &str)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (Self::column_to_letters(i), name.as_str()))
    }

    /// The ordered letter -> name mapping handed to downstream renderers
    pub fn to_mapping(&self) -> Vec<(String, String)> {
        self.iter()
            .map(|(letter, name)| (letter, name.to_string()))
            .collect()
    }

    fn push(&mut self, name: String) {
        self.by_name.insert(name.clone(), self.names.len());
        self.names.push(name);
    }

    fn unique_name(&self, header: &str) -> String {
        if !self.by_name.contains_key(header) {
            return header.to_string();
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}.{}", header, n);
            if !self.by_name.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

impl fmt::Display for ColumnSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (letter, name) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}={}", letter, name)?;
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ColumnSchema {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.names.len()))?;
        for (letter, name) in self.iter() {
            map.serialize_entry(&letter, name)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(ColumnSchema::column_to_letters(0), "A");
        assert_eq!(ColumnSchema::column_to_letters(25), "Z");
        assert_eq!(ColumnSchema::column_to_letters(26), "AA");
        assert_eq!(ColumnSchema::column_to_letters(27), "AB");
        assert_eq!(ColumnSchema::column_to_letters(701), "ZZ");
        assert_eq!(ColumnSchema::column_to_letters(702), "AAA");
    }

    #[test]
    fn test_letters_to_column() {
        assert_eq!(ColumnSchema::letters_to_column("A"), Some(0));
        assert_eq!(ColumnSchema::letters_to_column("z"), Some(25));
        assert_eq!(ColumnSchema::letters_to_column("AA"), Some(26));
        assert_eq!(ColumnSchema::letters_to_column("ZZ"), Some(701));
        assert_eq!(ColumnSchema::letters_to_column(""), None);
        assert_eq!(ColumnSchema::letters_to_column("A1"), None);
    }

    #[test]
    fn test_lookup_both_directions() {
        let schema = ColumnSchema::from_headers(["region", "sales"]);
        assert_eq!(schema.name_for("A"), Some("region"));
        assert_eq!(schema.name_for("b"), Some("sales"));
        assert_eq!(schema.name_for("C"), None);
        assert_eq!(schema.letter_for("sales").as_deref(), Some("B"));
        assert_eq!(schema.letter_for("missing"), None);
    }

    #[test]
    fn test_add_column_assigns_next_letter() {
        let mut schema = ColumnSchema::from_headers(["a", "b"]);
        assert_eq!(schema.add_column("derived"), "C");
        assert_eq!(schema.name_for("C"), Some("derived"));
        // Re-registering keeps the existing letter
        assert_eq!(schema.add_column("derived"), "C");
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn test_duplicate_headers_are_renamed() {
        let schema = ColumnSchema::from_headers(["x", "x", "x"]);
        assert_eq!(schema.names(), &["x", "x.1", "x.2"]);
    }

    #[test]
    fn test_display() {
        let schema = ColumnSchema::from_headers(["region", "sales"]);
        assert_eq!(schema.to_string(), "A=region, B=sales");
    }

    proptest! {
        #[test]
        fn prop_letters_round_trip(n in 0usize..=1000) {
            let headers: Vec<String> = (0..=n).map(|i| format!("col_{}", i)).collect();
            let schema = ColumnSchema::from_headers(headers);
            let letter = ColumnSchema::column_to_letters(n);
            let name = schema.name_for(&letter).unwrap().to_string();
            prop_assert_eq!(schema.letter_for(&name), Some(letter.clone()));
            prop_assert_eq!(ColumnSchema::letters_to_column(&letter), Some(n));
        }
    }
}
