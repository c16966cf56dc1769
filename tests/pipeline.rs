//! End-to-end tests for urlcount-report.
//!
//! Fixtures are real XLSX workbooks built with rust_xlsxwriter; outputs are
//! read back with calamine (workbook) and lopdf (summary PDF).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use lopdf::content::Content;
use lopdf::{Document, Object};
use rust_xlsxwriter::Workbook;
use serde_json::{json, Value};
use urlcount_report::pipeline::{decode::decode_workbook, encode::encode_workbook};
use urlcount_report::transport;
use urlcount_report::{
    process, process_sync, process_to_dir, Attachments, CellValue, ReportConfig, ReportError,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Route library logs to the test harness; `RUST_LOG=debug` shows stage timings.
fn init_logs() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn frozen() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap()
}

fn config(base: &str) -> ReportConfig {
    ReportConfig::builder()
        .base_name(base)
        .processed_at(frozen())
        .build()
        .unwrap()
}

/// A crawl export: header + `urls` data rows on a sheet called `sheet`.
fn crawl_export(sheet: &str, urls: usize) -> Vec<u8> {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name(sheet).unwrap();
    for (c, header) in ["Address", "Content Type", "Status Code", "Indexability"]
        .iter()
        .enumerate()
    {
        ws.write_string(0, c as u16, *header).unwrap();
    }
    for r in 1..=urls as u32 {
        ws.write_string(r, 0, format!("https://example.com/page-{r}"))
            .unwrap();
        ws.write_string(r, 1, "text/html; charset=utf-8").unwrap();
        ws.write_number(r, 2, 200).unwrap();
        ws.write_string(r, 3, "Indexable").unwrap();
    }
    wb.save_to_buffer().unwrap()
}

fn attachments(entries: &[(&str, Vec<u8>)]) -> Attachments {
    entries
        .iter()
        .map(|(name, bytes)| (name.to_string(), bytes.clone()))
        .collect()
}

/// Every `Tj` string on the summary page.
fn pdf_strings(pdf: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(pdf).expect("valid pdf");
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 1);
    let page_id = *pages.values().next().unwrap();
    let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
    content
        .operations
        .iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| match op.operands.first() {
            Some(Object::String(bytes, _)) => Some(bytes.iter().map(|&b| char::from(b)).collect()),
            _ => None,
        })
        .collect()
}

fn string(v: &str) -> CellValue {
    CellValue::String(v.to_string())
}

// ── Transport scenarios ─────────────────────────────────────────────────────

#[tokio::test]
async fn crawl1_end_to_end() {
    init_logs();
    let body = json!({
        "baseName": "crawl1",
        "fileContents": { "internal_all.xlsx": STANDARD.encode(crawl_export("Data", 5)) },
    });

    let response = transport::handle("POST", &body.to_string(), &ReportConfig::default()).await;
    assert_eq!(response.status, 200);

    let json: Value = serde_json::from_str(&response.to_json()).unwrap();
    assert_eq!(json["success"], json!(true));
    assert_eq!(json["urlCount"], json!(5));
    assert_eq!(json["message"], json!("Procesado completado: 5 URLs encontradas"));

    let files = json["generatedFiles"].as_object().unwrap();
    let names: Vec<&str> = files.keys().map(String::as_str).collect();
    assert_eq!(names, ["crawl1_conteo_urls.xlsx", "crawl1_conteo_urls.pdf"]);

    let xlsx = STANDARD
        .decode(files["crawl1_conteo_urls.xlsx"].as_str().unwrap())
        .unwrap();
    let doc = decode_workbook(&xlsx, "out.xlsx").unwrap();
    assert_eq!(doc.sheets.len(), 2);
    assert_eq!(doc.sheets[1].name, "Conteo URLs");

    let pdf = STANDARD
        .decode(files["crawl1_conteo_urls.pdf"].as_str().unwrap())
        .unwrap();
    let strings = pdf_strings(&pdf);
    assert!(strings.contains(&"5".to_string()), "{strings:?}");
    assert!(strings.contains(&"Rastreo: crawl1".to_string()), "{strings:?}");
}

#[tokio::test]
async fn unknown_attachment_reports_received_names() {
    let body = json!({ "fileContents": { "other.xlsx": STANDARD.encode(crawl_export("Data", 1)) } });
    let response = transport::handle("POST", &body.to_string(), &ReportConfig::default()).await;

    assert_eq!(response.status, 400);
    let json: Value = serde_json::from_str(&response.to_json()).unwrap();
    assert_eq!(json["success"], json!(false));
    assert!(json["error"].as_str().unwrap().contains("other.xlsx"));
    assert!(json.get("generatedFiles").is_none());
}

#[tokio::test]
async fn undecodable_unmatched_attachment_is_not_found() {
    let body = json!({ "fileContents": { "other.xlsx": "...", "meta": 12 } });
    let response = transport::handle("POST", &body.to_string(), &ReportConfig::default()).await;

    assert_eq!(response.status, 400);
    let json: Value = serde_json::from_str(&response.to_json()).unwrap();
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("No se encontro internal_all.xlsx"), "{error}");
    assert!(error.contains("other.xlsx, meta"), "{error}");
}

#[tokio::test]
async fn unrelated_attachments_do_not_block_the_export() {
    let body = json!({
        "fileContents": {
            "internal_all.xlsx": STANDARD.encode(crawl_export("Data", 1)),
            "notes.txt": "not*base64",
            "meta": 12,
        }
    });
    let response = transport::handle("POST", &body.to_string(), &ReportConfig::default()).await;

    assert_eq!(response.status, 200, "{}", response.to_json());
    let json: Value = serde_json::from_str(&response.to_json()).unwrap();
    assert_eq!(json["urlCount"], json!(1));
}

#[tokio::test]
async fn missing_file_contents_is_rejected() {
    for body in [json!({}), json!({ "fileContents": {} }), json!({ "fileContents": "x" })] {
        let response = transport::handle("POST", &body.to_string(), &ReportConfig::default()).await;
        assert_eq!(response.status, 400, "{body}");
        let json: Value = serde_json::from_str(&response.to_json()).unwrap();
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("No se recibieron archivos"));
    }
}

#[tokio::test]
async fn default_base_name_is_resultado() {
    let body = json!({ "fileContents": { "Internal_ALL.xlsx": STANDARD.encode(crawl_export("Data", 2)) } });
    let response = transport::handle("POST", &body.to_string(), &ReportConfig::default()).await;
    let json: Value = serde_json::from_str(&response.to_json()).unwrap();

    let files = json["generatedFiles"].as_object().unwrap();
    assert!(files.contains_key("resultado_conteo_urls.xlsx"));
    assert!(files.contains_key("resultado_conteo_urls.pdf"));

    let pdf = STANDARD
        .decode(files["resultado_conteo_urls.pdf"].as_str().unwrap())
        .unwrap();
    assert!(pdf_strings(&pdf).contains(&"Rastreo: N/A".to_string()));
}

#[tokio::test]
async fn corrupt_workbook_is_a_client_error() {
    let body = json!({ "fileContents": { "internal_all.xlsx": STANDARD.encode(b"Address\nhttps://a\n") } });
    let response = transport::handle("POST", &body.to_string(), &ReportConfig::default()).await;
    assert_eq!(response.status, 400);
}

// ── Pipeline properties ─────────────────────────────────────────────────────

#[tokio::test]
async fn count_excludes_header() {
    for urls in [0, 1, 5, 250] {
        let a = attachments(&[("internal_all.xlsx", crawl_export("Data", urls))]);
        let output = process(&a, &config("c")).await.unwrap();
        assert_eq!(output.url_count, urls as u64);
        assert_eq!(output.metrics.column_count, 4);
        assert_eq!(output.metrics.source_sheet_name, "Data");
    }
}

#[tokio::test]
async fn empty_first_sheet_counts_zero() {
    let mut wb = Workbook::new();
    wb.add_worksheet().set_name("Blank").unwrap();
    let bytes = wb.save_to_buffer().unwrap();

    let output = process(&attachments(&[("internal_all.xlsx", bytes)]), &config("c"))
        .await
        .unwrap();
    assert_eq!(output.url_count, 0);
    assert_eq!(output.metrics.column_count, 0);
}

#[tokio::test]
async fn summary_sheet_shape_and_content() {
    let a = attachments(&[
        ("crawl_overview.xlsx", b"ignored".to_vec()),
        ("internal_all.xlsx", crawl_export("Internal - All", 12)),
    ]);
    let output = process(&a, &config("crawl1")).await.unwrap();
    let doc = decode_workbook(output.workbook().unwrap(), "out.xlsx").unwrap();

    let summary = doc.sheet("Conteo URLs").expect("summary sheet");
    assert_eq!(summary.row_count(), 7);
    assert_eq!(summary.column_count(), 2);

    let rows: Vec<(CellValue, CellValue)> = summary
        .rows
        .iter()
        .map(|r| (r[0].value.clone(), r[1].value.clone()))
        .collect();
    assert_eq!(
        rows,
        [
            (string("Metrica"), string("Valor")),
            (string("Total de URLs"), CellValue::Number(12.0)),
            (string("Hoja de origen"), string("Internal - All")),
            (string("Columnas en el archivo"), CellValue::Number(4.0)),
            (string("Archivo procesado"), string("internal_all.xlsx")),
            (string("Fecha de procesado"), string("2026-10-19T08:30:00.000Z")),
            (string("Procesado por"), string("Vercel Processor Test")),
        ]
    );
}

#[tokio::test]
async fn original_sheets_survive_unchanged() {
    let mut wb = Workbook::new();
    let first = wb.add_worksheet();
    first.set_name("Data").unwrap();
    first.write_string(0, 0, "Address").unwrap();
    first.write_string(1, 0, "https://example.com/").unwrap();
    first.write_number(1, 3, 1.5).unwrap();
    let second = wb.add_worksheet();
    second.set_name("Notes").unwrap();
    second.write_boolean(4, 1, true).unwrap();
    let bytes = wb.save_to_buffer().unwrap();

    let original = decode_workbook(&bytes, "in.xlsx").unwrap();
    let output = process(&attachments(&[("internal_all.xlsx", bytes)]), &config("c"))
        .await
        .unwrap();
    let produced = decode_workbook(output.workbook().unwrap(), "out.xlsx").unwrap();

    let names: Vec<&str> = produced.sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Data", "Notes", "Conteo URLs"]);
    assert_eq!(produced.sheets[..2], original.sheets[..]);
}

#[test]
fn decode_encode_round_trip() {
    let bytes = crawl_export("Data", 3);
    let doc = decode_workbook(&bytes, "in.xlsx").unwrap();
    let again = decode_workbook(&encode_workbook(&doc).unwrap(), "again.xlsx").unwrap();
    assert_eq!(again, doc);
}

#[tokio::test]
async fn frozen_timestamp_is_reproducible() {
    let a = attachments(&[("internal_all.xlsx", crawl_export("Data", 3))]);
    let first = process(&a, &config("c")).await.unwrap();
    let second = process(&a, &config("c")).await.unwrap();

    assert_eq!(first.metrics, second.metrics);
    let first_doc = decode_workbook(first.workbook().unwrap(), "1.xlsx").unwrap();
    let second_doc = decode_workbook(second.workbook().unwrap(), "2.xlsx").unwrap();
    assert_eq!(first_doc, second_doc);
}

#[tokio::test]
async fn existing_summary_sheet_name_fails_internally() {
    init_logs();
    let bytes = crawl_export("Conteo URLs", 2);
    let err = process(&attachments(&[("internal_all.xlsx", bytes)]), &config("c"))
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::Serialization(_)), "{err:?}");
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn custom_pattern_and_label() {
    let config = ReportConfig::builder()
        .input_pattern("EXPORT")
        .processor_label("Nightly crawler")
        .processed_at(frozen())
        .build()
        .unwrap();
    let a = attachments(&[("site_export.xlsx", crawl_export("Data", 4))]);
    let output = process(&a, &config).await.unwrap();
    assert_eq!(output.url_count, 4);

    let doc = decode_workbook(output.workbook().unwrap(), "out.xlsx").unwrap();
    let summary = doc.sheet("Conteo URLs").unwrap();
    assert_eq!(summary.rows[6][1].value, string("Nightly crawler"));
}

#[test]
fn sync_wrapper() {
    let a = attachments(&[("internal_all.xlsx", crawl_export("Data", 7))]);
    let output = process_sync(&a, &config("sync")).unwrap();
    assert_eq!(output.url_count, 7);
    assert_eq!(
        output.files.names().collect::<Vec<_>>(),
        ["sync_conteo_urls.xlsx", "sync_conteo_urls.pdf"]
    );
}

#[tokio::test]
async fn writes_both_files_to_directory() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("reports");
    let a = attachments(&[("internal_all.xlsx", crawl_export("Data", 3))]);

    let output = process_to_dir(&a, &out_dir, &config("crawl1")).await.unwrap();
    assert_eq!(output.url_count, 3);

    let mut written: Vec<String> = std::fs::read_dir(&out_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    written.sort();
    assert_eq!(written, ["crawl1_conteo_urls.pdf", "crawl1_conteo_urls.xlsx"]);

    let pdf = std::fs::read(out_dir.join("crawl1_conteo_urls.pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn failed_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let a = attachments(&[("other.xlsx", crawl_export("Data", 3))]);
    let err = process_to_dir(&a, dir.path(), &config("x")).await.unwrap_err();
    assert!(matches!(err, ReportError::InputFileNotFound { .. }));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn failed_commit_leaves_neither_file() {
    let dir = tempfile::tempdir().unwrap();
    // A directory in the way of the PDF makes its rename fail after the
    // workbook has already been moved into place.
    std::fs::create_dir(dir.path().join("crawl1_conteo_urls.pdf")).unwrap();
    let a = attachments(&[("internal_all.xlsx", crawl_export("Data", 3))]);

    let err = process_to_dir(&a, dir.path(), &config("crawl1")).await.unwrap_err();
    assert!(matches!(err, ReportError::OutputWriteFailed { .. }), "{err:?}");

    let left: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(left, ["crawl1_conteo_urls.pdf"]);
    assert!(dir.path().join("crawl1_conteo_urls.pdf").is_dir());
}
