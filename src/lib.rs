//! # urlcount-report
//!
//! Count the URLs in a crawl export workbook (`internal_all.xlsx`) and hand
//! back two derived artifacts: the same workbook with an extra
//! "Conteo URLs" summary sheet, and a one-page PDF with the count.
//!
//! ## Pipeline Overview
//!
//! ```text
//! attachments
//!  │
//!  ├─ 1. Locate   first file whose name contains "internal_all"
//!  ├─ 2. Decode   XLSX → TabularDocument (calamine)
//!  ├─ 3. Metrics  rows − header, sheet name, column count, timestamp
//!  ├─ 4a. Compose + Encode   append styled summary sheet → .xlsx (rust_xlsxwriter)
//!  ├─ 4b. Render             one-page summary → .pdf (lopdf)
//!  └─ 5. Package  {base}_conteo_urls.xlsx + {base}_conteo_urls.pdf
//! ```
//!
//! A run is stateless and all-or-nothing: either both artifacts come back,
//! or a [`ReportError`] explains why neither did.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use urlcount_report::{process, Attachments, ReportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut attachments = Attachments::new();
//!     attachments.insert("internal_all.xlsx", std::fs::read("internal_all.xlsx")?);
//!
//!     let config = ReportConfig::builder().base_name("crawl1").build()?;
//!     let output = process(&attachments, &config).await?;
//!     for name in output.files.names() {
//!         println!("{name}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Transport
//!
//! [`transport`] wraps the pipeline in the JSON/base64 envelope used by the
//! upload automation (`fileContents` in, `generatedFiles` out) and maps
//! errors to status codes. It is plain functions over strings, so any HTTP
//! framework can host it.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `urlcount` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod transport;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ReportConfig, ReportConfigBuilder};
pub use document::{Cell, CellStyle, CellValue, Rgb, Sheet, TabularDocument};
pub use error::ReportError;
pub use output::{Attachments, GeneratedFiles, OutputNames, ReportOutput};
pub use pipeline::metrics::Metrics;
pub use process::{locate_input, process, process_file, process_sync, process_to_dir};
