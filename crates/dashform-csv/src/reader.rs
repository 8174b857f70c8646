//! CSV reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;
use dashform_core::{CellValue, ColumnSchema, Table};

/// Loads CSV data into a [`Table`]
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into a table
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<Table> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let table = Self::read(file, options)?;
        log::info!(
            "loaded {} rows x {} columns from {}",
            table.row_count(),
            table.column_count(),
            path.display()
        );
        Ok(table)
    }

    /// Read CSV text into a table
    pub fn read_str(text: &str, options: &CsvReadOptions) -> CsvResult<Table> {
        Self::read(text.as_bytes(), options)
    }

    /// Read CSV from a reader into a table.
    ///
    /// The header row becomes the column schema (letters A, B, ... in header
    /// order). Records longer than the header are truncated, shorter ones
    /// padded with empty values.
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<Table> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(options.has_header)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            let row: Vec<CellValue> = record
                .iter()
                .map(|field| Self::convert_field(field, options))
                .collect();
            records.push(row);
        }

        let headers: Vec<String> = if options.has_header {
            let headers = csv_reader.headers()?;
            if headers.is_empty() {
                return Err(CsvError::MissingHeader);
            }
            headers.iter().map(|h| h.trim().to_string()).collect()
        } else {
            let width = records.iter().map(Vec::len).max().unwrap_or(0);
            (0..width).map(ColumnSchema::column_to_letters).collect()
        };

        log::debug!("csv headers: {:?}", headers);
        Ok(Table::from_rows(headers, records))
    }

    fn convert_field(field: &str, options: &CsvReadOptions) -> CellValue {
        if options.auto_detect_types {
            CellValue::detect(field)
        } else if field.is_empty() {
            CellValue::Empty
        } else {
            CellValue::string(field)
        }
    }
}
