//! Summary rendering: [`Metrics`] → one-page PDF.
//!
//! The page is laid out top to bottom with a text cursor, the way a flowing
//! document writer would: every text line advances the cursor by one line
//! height at its font size, and `move_down` advances by multiples of the
//! current line height. Everything on the page (fonts, sizes, colours,
//! divider coordinates) is a constant of this module.
//!
//! Text uses the standard Helvetica Type1 font with WinAnsi encoding, so no
//! font program is embedded. Centring needs glyph advances, which come from
//! the Helvetica AFM metrics in [`HELVETICA_WIDTHS`].
//!
//! The document is assembled in memory and serialised into a private buffer
//! that is returned only once `save_to` has completed.

use crate::document::Rgb;
use crate::error::ReportError;
use crate::pipeline::metrics::Metrics;
use chrono::{DateTime, Local, TimeZone};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use std::fmt::Display;
use tracing::debug;

// ── Page geometry (US Letter, points) ────────────────────────────────────

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 50.0;
/// Dividers run from x=50 to x=545.
pub const RULE_X: (f32, f32) = (50.0, 545.0);

// ── Text ─────────────────────────────────────────────────────────────────

pub const TITLE: &str = "Conteo de URLs";
pub const SUBTITLE: &str = "Generado por SF Automation - Procesador de prueba Vercel";
pub const CAPTION: &str = "URLs encontradas";
/// Shown on the "Rastreo" line when no base name was given.
pub const TRACE_PLACEHOLDER: &str = "N/A";

const TITLE_SIZE: f32 = 22.0;
const SUBTITLE_SIZE: f32 = 10.0;
const COUNT_SIZE: f32 = 72.0;
const CAPTION_SIZE: f32 = 16.0;
const DETAIL_SIZE: f32 = 11.0;

// ── Colours ──────────────────────────────────────────────────────────────

const TITLE_COLOR: Rgb = Rgb(0x1E293B);
const SUBTITLE_COLOR: Rgb = Rgb(0x64748B);
const RULE_COLOR: Rgb = Rgb(0xE2E8F0);
const COUNT_COLOR: Rgb = Rgb(0x3B82F6);
const CAPTION_COLOR: Rgb = Rgb(0x475569);
const DETAIL_COLOR: Rgb = Rgb(0x334155);

// ── Helvetica metrics (per 1000 units of em) ─────────────────────────────

const ASCENDER: f32 = 718.0;
/// (ascender − descender + line gap) / 1000 = (718 + 207 + 231) / 1000.
const LINE_HEIGHT_FACTOR: f32 = 1.156;
const FONT_RESOURCE: &str = "F1";

/// Advance widths for WinAnsi codes 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];
/// Used for Latin-1 letters above 0x7E; most accented glyphs share it.
const DEFAULT_WIDTH: u16 = 556;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
}

/// Render the one-page summary for `metrics`.
///
/// `trace_label` is printed on the "Rastreo" line; `None` prints `N/A`.
/// The "Fecha" line uses the machine's local time zone.
pub fn render_summary(metrics: &Metrics, trace_label: Option<&str>) -> Result<Vec<u8>, ReportError> {
    render_summary_in(metrics, trace_label, &Local)
}

/// [`render_summary`] with an explicit time zone for the "Fecha" line.
pub fn render_summary_in<Tz>(
    metrics: &Metrics,
    trace_label: Option<&str>,
    tz: &Tz,
) -> Result<Vec<u8>, ReportError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut page = PageWriter::new();

    page.text(TITLE, TITLE_SIZE, TITLE_COLOR, Align::Center);
    page.move_down(0.5);
    page.text(SUBTITLE, SUBTITLE_SIZE, SUBTITLE_COLOR, Align::Center);
    page.move_down(2.0);

    page.rule(RULE_COLOR);
    page.move_down(1.5);

    page.text(&metrics.url_count.to_string(), COUNT_SIZE, COUNT_COLOR, Align::Center);
    page.text(CAPTION, CAPTION_SIZE, CAPTION_COLOR, Align::Center);
    page.move_down(2.0);

    page.rule(RULE_COLOR);
    page.move_down(1.5);

    let local = metrics.processed_at_utc.with_timezone(tz);
    let details = [
        format!("Rastreo: {}", trace_label.unwrap_or(TRACE_PLACEHOLDER)),
        format!("Archivo: {}", metrics.source_file_name),
        format!("Fecha: {}", format_timestamp(&local)),
    ];
    for (i, line) in details.iter().enumerate() {
        if i > 0 {
            page.move_down(0.3);
        }
        page.text(line, DETAIL_SIZE, DETAIL_COLOR, Align::Left);
    }

    let bytes = assemble(page.into_operations(), metrics)?;
    debug!("Rendered summary PDF → {} bytes", bytes.len());
    Ok(bytes)
}

/// `19/10/2026, 8:30:00`: day/month/year, 24-hour clock.
pub fn format_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format("%-d/%-m/%Y, %-H:%M:%S").to_string()
}

/// Build the PDF object graph around one content stream.
fn assemble(operations: Vec<Operation>, metrics: &Metrics) -> Result<Vec<u8>, ReportError> {
    let mut doc = Document::with_version("1.3");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { FONT_RESOURCE => font_id },
    });

    let content = Content { operations }
        .encode()
        .map_err(|e| ReportError::Render(format!("content stream: {e}")))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let created = metrics.processed_at_utc.format("D:%Y%m%d%H%M%SZ").to_string();
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(TITLE),
        "Producer" => Object::string_literal(concat!("urlcount-report ", env!("CARGO_PKG_VERSION"))),
        "CreationDate" => Object::string_literal(created),
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| ReportError::Render(format!("write: {e}")))?;
    Ok(buf)
}

/// Cursor-based writer for a single page's content stream.
///
/// `y` is measured downwards from the top edge, starting at the margin.
struct PageWriter {
    y: f32,
    font_size: f32,
    operations: Vec<Operation>,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            y: MARGIN,
            font_size: 12.0,
            operations: Vec::new(),
        }
    }

    fn line_height(&self) -> f32 {
        self.font_size * LINE_HEIGHT_FACTOR
    }

    fn move_down(&mut self, lines: f32) {
        self.y += lines * self.line_height();
    }

    fn text(&mut self, text: &str, size: f32, color: Rgb, align: Align) {
        self.font_size = size;
        let encoded = encode_win_ansi(text);

        let x = match align {
            Align::Left => MARGIN,
            Align::Center => {
                let available = PAGE_WIDTH - 2.0 * MARGIN;
                MARGIN + (available - text_width(&encoded, size)) / 2.0
            }
        };
        let baseline = PAGE_HEIGHT - (self.y + ASCENDER / 1000.0 * size);

        let (r, g, b) = color.to_unit();
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new("Tf", vec![Object::Name(FONT_RESOURCE.into()), size.into()]),
            Operation::new("Td", vec![x.into(), baseline.into()]),
            Operation::new("Tj", vec![Object::String(encoded, StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ]);

        self.y += self.line_height();
    }

    /// Horizontal divider at the cursor; the cursor does not move.
    fn rule(&mut self, color: Rgb) {
        let y = PAGE_HEIGHT - self.y;
        let (r, g, b) = color.to_unit();
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("RG", vec![r.into(), g.into(), b.into()]),
            Operation::new("w", vec![1.into()]),
            Operation::new("m", vec![RULE_X.0.into(), y.into()]),
            Operation::new("l", vec![RULE_X.1.into(), y.into()]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    fn into_operations(self) -> Vec<Operation> {
        self.operations
    }
}

/// Map text to WinAnsi bytes; anything outside Latin-1 becomes `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => b'?',
        })
        .collect()
}

fn text_width(encoded: &[u8], size: f32) -> f32 {
    let units: u32 = encoded
        .iter()
        .map(|&b| match b {
            32..=126 => u32::from(HELVETICA_WIDTHS[usize::from(b - 32)]),
            _ => u32::from(DEFAULT_WIDTH),
        })
        .sum();
    units as f32 * size / 1000.0
}
