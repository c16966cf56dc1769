//! Report composition: append the "Conteo URLs" summary sheet.
//!
//! The composer never touches the uploaded sheets. It clones them into a new
//! [`TabularDocument`] and appends one fixed-shape sheet: a styled header
//! plus six metric rows, always in the same order.

use crate::document::{Cell, CellStyle, CellValue, Rgb, Sheet, TabularDocument};
use crate::pipeline::metrics::Metrics;

/// Name of the appended sheet.
pub const SUMMARY_SHEET_NAME: &str = "Conteo URLs";

/// Header fill.
pub const HEADER_FILL: Rgb = Rgb(0x3B82F6);
/// Fill for alternating data rows.
pub const STRIPE_FILL: Rgb = Rgb(0xF1F5F9);

/// Widths of the metric-name and value columns.
pub const COLUMN_WIDTHS: [f64; 2] = [35.0, 20.0];

/// Build `doc` + the summary sheet. `processor_label` fills "Procesado por".
pub fn compose_report(doc: &TabularDocument, metrics: &Metrics, processor_label: &str) -> TabularDocument {
    let mut sheets = doc.sheets.clone();
    sheets.push(summary_sheet(metrics, processor_label));
    TabularDocument::new(sheets)
}

/// The summary sheet on its own: 7 rows x 2 columns.
pub fn summary_sheet(metrics: &Metrics, processor_label: &str) -> Sheet {
    let header_style = CellStyle {
        bold: true,
        font_color: Some(Rgb::WHITE),
        fill: Some(HEADER_FILL),
    };

    let data: [(&str, CellValue); 6] = [
        ("Total de URLs", CellValue::Number(metrics.url_count as f64)),
        ("Hoja de origen", metrics.source_sheet_name.clone().into()),
        (
            "Columnas en el archivo",
            CellValue::Number(metrics.column_count as f64),
        ),
        ("Archivo procesado", metrics.source_file_name.clone().into()),
        ("Fecha de procesado", metrics.processed_at_iso().into()),
        ("Procesado por", processor_label.into()),
    ];

    let mut sheet = Sheet::new(SUMMARY_SHEET_NAME);
    sheet.column_widths = vec![(0, COLUMN_WIDTHS[0]), (1, COLUMN_WIDTHS[1])];
    sheet.rows.push(vec![
        Cell::styled("Metrica", header_style),
        Cell::styled("Valor", header_style),
    ]);

    for (i, (label, value)) in data.into_iter().enumerate() {
        // Sheet rows 3, 5 and 7 (1-based) carry the stripe.
        let sheet_row = i + 2;
        let fill = (sheet_row % 2 == 1).then_some(STRIPE_FILL);

        sheet.rows.push(vec![
            Cell::styled(
                label,
                CellStyle {
                    bold: true,
                    fill,
                    ..CellStyle::default()
                },
            ),
            Cell::styled(
                value,
                CellStyle {
                    fill,
                    ..CellStyle::default()
                },
            ),
        ]);
    }

    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn metrics() -> Metrics {
        Metrics {
            url_count: 42,
            source_sheet_name: "Internal - All".into(),
            column_count: 61,
            source_file_name: "internal_all.xlsx".into(),
            processed_at_utc: Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap(),
        }
    }

    fn labels(sheet: &Sheet) -> Vec<CellValue> {
        sheet.rows.iter().map(|r| r[0].value.clone()).collect()
    }

    #[test]
    fn appends_after_existing_sheets() {
        let original = TabularDocument::new(vec![Sheet::new("Data"), Sheet::new("Other")]);
        let out = compose_report(&original, &metrics(), "proc");

        let names: Vec<_> = out.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Data", "Other", "Conteo URLs"]);
        assert_eq!(out.sheets[..2], original.sheets[..]);
    }

    #[test]
    fn fixed_shape_and_order() {
        let sheet = summary_sheet(&metrics(), "Vercel Processor Test");
        assert_eq!(sheet.row_count(), 7);
        assert_eq!(sheet.column_count(), 2);
        assert_eq!(
            labels(&sheet),
            [
                "Metrica",
                "Total de URLs",
                "Hoja de origen",
                "Columnas en el archivo",
                "Archivo procesado",
                "Fecha de procesado",
                "Procesado por",
            ]
            .map(CellValue::from)
        );

        let values: Vec<_> = sheet.rows.iter().map(|r| r[1].value.clone()).collect();
        assert_eq!(values[0], CellValue::from("Valor"));
        assert_eq!(values[1], CellValue::Number(42.0));
        assert_eq!(values[2], CellValue::from("Internal - All"));
        assert_eq!(values[3], CellValue::Number(61.0));
        assert_eq!(values[4], CellValue::from("internal_all.xlsx"));
        assert_eq!(values[5], CellValue::from("2026-10-19T08:30:00.000Z"));
        assert_eq!(values[6], CellValue::from("Vercel Processor Test"));
    }

    #[test]
    fn header_and_stripes() {
        let sheet = summary_sheet(&metrics(), "p");

        for cell in &sheet.rows[0] {
            assert!(cell.style.bold);
            assert_eq!(cell.style.font_color, Some(Rgb::WHITE));
            assert_eq!(cell.style.fill, Some(HEADER_FILL));
        }

        for (idx, row) in sheet.rows.iter().enumerate().skip(1) {
            let sheet_row = idx + 1;
            let expected = if matches!(sheet_row, 3 | 5 | 7) {
                Some(STRIPE_FILL)
            } else {
                None
            };
            assert!(row[0].style.bold, "row {sheet_row} label should be bold");
            assert!(!row[1].style.bold);
            assert_eq!(row[0].style.fill, expected, "row {sheet_row}");
            assert_eq!(row[1].style.fill, expected, "row {sheet_row}");
        }
    }

    #[test]
    fn column_widths() {
        let sheet = summary_sheet(&metrics(), "p");
        assert_eq!(sheet.column_widths, vec![(0, 35.0), (1, 20.0)]);
    }

    #[test]
    fn deterministic_for_same_metrics() {
        let doc = TabularDocument::new(vec![Sheet::new("Data")]);
        assert_eq!(
            compose_report(&doc, &metrics(), "p"),
            compose_report(&doc, &metrics(), "p")
        );
    }
}
