//! In-memory tabular document shared by every pipeline stage.
//!
//! The decoder produces a [`TabularDocument`], the composer builds a new one
//! from it, and the encoder serialises the result. Stages never mutate a
//! document they received; they construct a new value instead.

use serde::{Deserialize, Serialize};

/// A 24-bit RGB colour, e.g. `Rgb(0x3B82F6)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u32);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xFFFFFF);

    /// Components scaled to `0.0..=1.0`, as PDF colour operators expect.
    pub fn to_unit(self) -> (f32, f32, f32) {
        let r = ((self.0 >> 16) & 0xFF) as f32 / 255.0;
        let g = ((self.0 >> 8) & 0xFF) as f32 / 255.0;
        let b = (self.0 & 0xFF) as f32 / 255.0;
        (r, g, b)
    }
}

/// The value stored in a cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    String(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date (days since 1899-12-30, fractional part = time).
    DateTime(f64),
    /// Error literal such as `#DIV/0!`.
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// Visual formatting of a cell. `Default` is unformatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellStyle {
    pub bold: bool,
    pub font_color: Option<Rgb>,
    /// Solid pattern fill.
    pub fill: Option<Rgb>,
}

impl CellStyle {
    pub fn is_plain(&self) -> bool {
        *self == CellStyle::default()
    }
}

/// A single cell: value plus style.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
}

impl Cell {
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            style: CellStyle::default(),
        }
    }

    pub fn styled(value: impl Into<CellValue>, style: CellStyle) -> Self {
        Self {
            value: value.into(),
            style,
        }
    }
}

/// One worksheet.
///
/// Rows are stored from the sheet's first row, so `rows[0]` is row 1 and
/// `rows[r][c]` sits at the same position it had in the source workbook.
/// Trailing empty cells are not stored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
    /// Explicit column widths as `(0-based column, width in characters)`.
    pub column_widths: Vec<(u16, f64)>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Number of rows up to and including the last used one.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Widest row, counting up to its last non-empty cell.
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .rposition(|cell| !cell.value.is_empty() || !cell.style.is_plain())
                    .map_or(0, |i| i + 1)
            })
            .max()
            .unwrap_or(0)
    }

    /// Cell at a 0-based position, if stored.
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

/// An ordered collection of sheets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TabularDocument {
    pub sheets: Vec<Sheet>,
}

impl TabularDocument {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn first_sheet(&self) -> Option<&Sheet> {
        self.sheets.first()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}
