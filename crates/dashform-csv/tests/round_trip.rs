//! Loading and saving tables through files on disk

use dashform_core::CellValue;
use dashform_csv::{CsvError, CsvReadOptions, CsvReader, CsvWriteOptions, CsvWriter};
use pretty_assertions::assert_eq;
use std::io::Write;

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sales.csv");

    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "region,sales,date").unwrap();
    writeln!(file, "east,100,2024-01-15").unwrap();
    writeln!(file, "west,250.5,2024-02-01").unwrap();
    drop(file);

    let table = CsvReader::read_file(&path, &CsvReadOptions::default()).unwrap();
    assert_eq!(table.schema().to_string(), "A=region, B=sales, C=date");
    assert_eq!(
        table.column_values("sales").unwrap(),
        &[CellValue::Number(100.0), CellValue::Number(250.5)]
    );

    let out = dir.path().join("out.csv");
    CsvWriter::write_file(&table, &out, &CsvWriteOptions::default()).unwrap();
    let reloaded = CsvReader::read_file(&out, &CsvReadOptions::default()).unwrap();
    assert_eq!(reloaded, table);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = CsvReader::read_file(dir.path().join("absent.csv"), &CsvReadOptions::default());
    assert!(matches!(result, Err(CsvError::Io(_))));
}
