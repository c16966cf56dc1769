//! Workbook encoding: [`TabularDocument`] → `.xlsx` bytes.
//!
//! rust_xlsxwriter builds the whole package in memory and only hands back
//! bytes from `save_to_buffer` once every part has been written, so a failure
//! half-way through never leaks a truncated workbook.

use crate::document::{Cell, CellStyle, CellValue, Sheet, TabularDocument};
use crate::error::ReportError;
use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook, Worksheet, XlsxError};
use tracing::debug;

/// Number format applied to cells that held dates in the source workbook.
const DATE_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Serialise every sheet of `doc`, in order, into an XLSX package.
pub fn encode_workbook(doc: &TabularDocument) -> Result<Vec<u8>, ReportError> {
    if doc.is_empty() {
        return Err(ReportError::Serialization(
            "document has no sheets to write".into(),
        ));
    }

    let mut workbook = Workbook::new();
    for sheet in &doc.sheets {
        let worksheet = workbook.add_worksheet();
        write_sheet(worksheet, sheet).map_err(|e| {
            ReportError::Serialization(format!("sheet '{}': {}", sheet.name, e))
        })?;
    }

    let bytes = workbook
        .save_to_buffer()
        .map_err(|e| ReportError::Serialization(e.to_string()))?;
    debug!("Encoded {} sheets → {} bytes", doc.sheets.len(), bytes.len());
    Ok(bytes)
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet) -> Result<(), XlsxError> {
    worksheet.set_name(&sheet.name)?;

    for &(col, width) in &sheet.column_widths {
        worksheet.set_column_width(col, width)?;
    }

    for (r, row) in sheet.rows.iter().enumerate() {
        let r = u32::try_from(r).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (c, cell) in row.iter().enumerate() {
            let c = u16::try_from(c).map_err(|_| XlsxError::RowColumnLimitError)?;
            write_cell(worksheet, r, c, cell)?;
        }
    }
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<(), XlsxError> {
    let format = format_for(&cell.style);

    match &cell.value {
        CellValue::Empty => {
            if !cell.style.is_plain() {
                worksheet.write_blank(row, col, &format)?;
            }
        }
        CellValue::String(s) | CellValue::Error(s) => {
            worksheet.write_string_with_format(row, col, s, &format)?;
        }
        CellValue::Number(n) => {
            worksheet.write_number_with_format(row, col, *n, &format)?;
        }
        CellValue::Bool(b) => {
            worksheet.write_boolean_with_format(row, col, *b, &format)?;
        }
        CellValue::DateTime(serial) => {
            let format = format.set_num_format(DATE_NUM_FORMAT);
            worksheet.write_number_with_format(row, col, *serial, &format)?;
        }
    }
    Ok(())
}

fn format_for(style: &CellStyle) -> Format {
    let mut format = Format::new();
    if style.bold {
        format = format.set_bold();
    }
    if let Some(color) = style.font_color {
        format = format.set_font_color(Color::RGB(color.0));
    }
    if let Some(fill) = style.fill {
        format = format
            .set_pattern(FormatPattern::Solid)
            .set_background_color(Color::RGB(fill.0));
    }
    format
}
