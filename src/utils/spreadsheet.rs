use crate::utils::error::AppError;
use calamine::{open_workbook_auto, Data, Reader};
use serde_json::{Map, Value};
use std::path::Path;

/// Tabular contents of the first worksheet: ordered column labels plus one
/// record per non-blank data row, keyed by column label.
#[derive(Debug)]
pub struct ParsedSheet {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

/// Parses a stored `.xlsx`/`.xls` file into row records.
///
/// The first row of the first worksheet is the header row; every following
/// non-blank row becomes a record mapping header label to cell value, in
/// sheet column order. Columns with an empty header cell are dropped. A sheet
/// with no data rows is an `EmptyDocument`; anything the underlying reader
/// rejects is a `ParseFailure`.
pub fn parse_sheet(path: &Path) -> Result<ParsedSheet, AppError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| AppError::ParseFailure(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AppError::EmptyDocument("Spreadsheet file is empty".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| AppError::ParseFailure(e.to_string()))?;

    let mut row_iter = range.rows();
    let header = match row_iter.next() {
        Some(row) => row,
        None => return Err(AppError::EmptyDocument("Spreadsheet file is empty".to_string())),
    };

    // (column index, label) for every non-empty header cell, in sheet order
    let labeled: Vec<(usize, String)> = header
        .iter()
        .enumerate()
        .filter_map(|(idx, cell)| header_label(cell).map(|label| (idx, label)))
        .collect();

    if labeled.is_empty() {
        return Err(AppError::EmptyDocument("Spreadsheet file is empty".to_string()));
    }

    let mut rows = Vec::new();
    for row in row_iter {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        let mut record = Map::new();
        for (idx, label) in &labeled {
            let cell = row.get(*idx).unwrap_or(&Data::Empty);
            record.insert(label.clone(), cell_value(cell));
        }
        rows.push(record);
    }

    if rows.is_empty() {
        return Err(AppError::EmptyDocument("Spreadsheet file is empty".to_string()));
    }

    let columns = labeled.into_iter().map(|(_, label)| label).collect();
    Ok(ParsedSheet { columns, rows })
}

fn header_label(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        other => Some(other.to_string()),
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => {
            // Excel stores integers as floats; keep them integral in JSON
            if f.fract() == 0.0 && f.abs() < (i64::MAX as f64) {
                Value::from(*f as i64)
            } else {
                Value::from(*f)
            }
        }
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => Value::from(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(_) => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use std::path::PathBuf;

    fn write_workbook(rows: &[Vec<&str>]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.xlsx");
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                // empty strings stand for cells that were never written
                if !cell.is_empty() {
                    worksheet
                        .write_string(r as u32, c as u16, *cell)
                        .unwrap();
                }
            }
        }
        workbook.save(&path).unwrap();
        (dir, path)
    }

    #[test]
    fn columns_are_the_ordered_keys_of_the_first_row() {
        let (_dir, path) = write_workbook(&[
            vec!["Month", "Revenue", "Region"],
            vec!["Jan", "1200", "North"],
            vec!["Feb", "900", "South"],
        ]);

        let parsed = parse_sheet(&path).unwrap();
        assert_eq!(parsed.columns, vec!["Month", "Revenue", "Region"]);
        assert_eq!(parsed.rows.len(), 2);

        let first_keys: Vec<&String> = parsed.rows[0].keys().collect();
        assert_eq!(first_keys, vec!["Month", "Revenue", "Region"]);
        assert_eq!(parsed.rows[0]["Month"], Value::String("Jan".into()));
    }

    #[test]
    fn numeric_cells_come_back_as_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("numbers.xlsx");
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "Product").unwrap();
        worksheet.write_string(0, 1, "Units").unwrap();
        worksheet.write_string(1, 0, "Widget").unwrap();
        worksheet.write_number(1, 1, 42.0).unwrap();
        workbook.save(&path).unwrap();

        let parsed = parse_sheet(&path).unwrap();
        assert_eq!(parsed.rows[0]["Units"], Value::from(42));
    }

    #[test]
    fn header_only_sheet_is_an_empty_document() {
        let (_dir, path) = write_workbook(&[vec!["Name", "Score"]]);
        match parse_sheet(&path) {
            Err(AppError::EmptyDocument(_)) => {}
            other => panic!("expected EmptyDocument, got {:?}", other),
        }
    }

    #[test]
    fn sheet_with_no_cells_is_an_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.xlsx");
        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        workbook.save(&path).unwrap();

        match parse_sheet(&path) {
            Err(AppError::EmptyDocument(_)) => {}
            other => panic!("expected EmptyDocument, got {:?}", other),
        }
    }

    #[test]
    fn garbage_bytes_are_a_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"definitely not a zip archive").unwrap();

        match parse_sheet(&path) {
            Err(AppError::ParseFailure(_)) => {}
            other => panic!("expected ParseFailure, got {:?}", other),
        }
    }

    #[test]
    fn blank_rows_and_unnamed_columns_are_skipped() {
        let (_dir, path) = write_workbook(&[
            vec!["Name", "", "City"],
            vec!["Ada", "ignored", "London"],
            vec!["", "", ""],
            vec!["Grace", "ignored", "Arlington"],
        ]);

        let parsed = parse_sheet(&path).unwrap();
        assert_eq!(parsed.columns, vec!["Name", "City"]);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[1]["City"], Value::String("Arlington".into()));
    }
}
