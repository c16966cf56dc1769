//! Workbook decoding: `.xlsx` bytes → [`TabularDocument`].
//!
//! ## Why check the magic bytes first?
//!
//! An XLSX file is a zip archive. Uploads that are really CSVs or legacy
//! `.xls` files would otherwise surface as an opaque "invalid zip" error deep
//! inside calamine. Checking for `PK\x03\x04` up front lets us report the
//! first bytes we actually received.
//!
//! Cells are placed at their original positions: a sheet whose used range
//! starts at `C3` gets two blank leading rows and two blank leading cells per
//! row, so row numbering matches what the uploader sees in Excel.

use crate::document::{Cell, CellValue, Sheet, TabularDocument};
use crate::error::ReportError;
use calamine::{Data, Range, Reader, Xlsx};
use std::io::Cursor;
use tracing::debug;

const ZIP_MAGIC: [u8; 4] = *b"PK\x03\x04";

/// Decode every sheet of an XLSX workbook, in workbook order.
///
/// `file` is only used to label errors.
pub fn decode_workbook(bytes: &[u8], file: &str) -> Result<TabularDocument, ReportError> {
    if bytes.len() < ZIP_MAGIC.len() || bytes[..4] != ZIP_MAGIC {
        let head = &bytes[..bytes.len().min(4)];
        return Err(ReportError::MalformedDocument {
            file: file.to_string(),
            detail: format!("not an XLSX (zip) container, first bytes: {head:?}"),
        });
    }

    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| ReportError::MalformedDocument {
            file: file.to_string(),
            detail: e.to_string(),
        })?;

    let names = workbook.sheet_names();
    let mut sheets = Vec::with_capacity(names.len());

    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ReportError::MalformedDocument {
                file: file.to_string(),
                detail: format!("sheet '{name}': {e}"),
            })?;

        let sheet = sheet_from_range(name, &range);
        debug!(
            "Decoded sheet '{}': {} rows x {} columns",
            sheet.name,
            sheet.row_count(),
            sheet.column_count()
        );
        sheets.push(sheet);
    }

    Ok(TabularDocument::new(sheets))
}

/// Lay a calamine range out from `A1`.
fn sheet_from_range(name: String, range: &Range<Data>) -> Sheet {
    let mut sheet = Sheet::new(name);
    let Some((start_row, start_col)) = range.start() else {
        return sheet;
    };

    sheet.rows.resize_with(start_row as usize, Vec::new);

    for source_row in range.rows() {
        let mut row: Vec<Cell> = Vec::with_capacity(start_col as usize + source_row.len());
        row.resize_with(start_col as usize, Cell::default);
        row.extend(source_row.iter().map(|data| Cell::new(cell_value(data))));

        while row.last().is_some_and(|c| c.value.is_empty()) {
            row.pop();
        }
        sheet.rows.push(row);
    }

    sheet
}

fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn workbook_bytes(build: impl FnOnce(&mut Workbook)) -> Vec<u8> {
        let mut wb = Workbook::new();
        build(&mut wb);
        wb.save_to_buffer().expect("fixture workbook")
    }

    #[test]
    fn rejects_non_zip_bytes() {
        let err = decode_workbook(b"Address,Status\n", "internal_all.csv").unwrap_err();
        match err {
            ReportError::MalformedDocument { file, detail } => {
                assert_eq!(file, "internal_all.csv");
                assert!(detail.contains("zip"), "got: {detail}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_truncated_zip() {
        let mut bytes = workbook_bytes(|wb| {
            wb.add_worksheet().write_string(0, 0, "x").unwrap();
        });
        bytes.truncate(40);
        let err = decode_workbook(&bytes, "internal_all.xlsx").unwrap_err();
        assert!(matches!(err, ReportError::MalformedDocument { .. }));
    }

    #[test]
    fn rejects_empty_buffer() {
        let err = decode_workbook(&[], "internal_all.xlsx").unwrap_err();
        assert!(matches!(err, ReportError::MalformedDocument { .. }));
    }

    #[test]
    fn decodes_values_in_place() {
        let bytes = workbook_bytes(|wb| {
            let ws = wb.add_worksheet();
            ws.set_name("Data").unwrap();
            ws.write_string(0, 0, "Address").unwrap();
            ws.write_string(0, 1, "Status Code").unwrap();
            ws.write_string(1, 0, "https://example.com/").unwrap();
            ws.write_number(1, 1, 200).unwrap();
            ws.write_boolean(2, 2, true).unwrap();
        });

        let doc = decode_workbook(&bytes, "internal_all.xlsx").unwrap();
        assert_eq!(doc.sheets.len(), 1);
        let sheet = &doc.sheets[0];
        assert_eq!(sheet.name, "Data");
        assert_eq!(sheet.row_count(), 3);
        assert_eq!(sheet.column_count(), 3);
        assert_eq!(sheet.cell(1, 1).unwrap().value, CellValue::Number(200.0));
        assert_eq!(sheet.cell(2, 2).unwrap().value, CellValue::Bool(true));
        assert_eq!(sheet.cell(2, 0).unwrap().value, CellValue::Empty);
    }

    #[test]
    fn offset_range_keeps_positions() {
        let bytes = workbook_bytes(|wb| {
            let ws = wb.add_worksheet();
            ws.write_string(2, 2, "C3").unwrap();
        });

        let doc = decode_workbook(&bytes, "x.xlsx").unwrap();
        let sheet = &doc.sheets[0];
        assert_eq!(sheet.row_count(), 3);
        assert_eq!(sheet.column_count(), 3);
        assert!(sheet.rows[0].is_empty());
        assert_eq!(sheet.cell(2, 2).unwrap().value, CellValue::from("C3"));
    }

    #[test]
    fn keeps_sheet_order() {
        let bytes = workbook_bytes(|wb| {
            wb.add_worksheet().set_name("Zeta").unwrap();
            wb.add_worksheet().set_name("Alpha").unwrap();
        });

        let doc = decode_workbook(&bytes, "x.xlsx").unwrap();
        let names: Vec<_> = doc.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Zeta", "Alpha"]);
        assert_eq!(doc.sheets[0].row_count(), 0);
    }
}
