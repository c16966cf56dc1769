//! Pipeline stages for turning a crawl export into a report.
//!
//! Each submodule implements exactly one transformation step and exchanges
//! plain values with its neighbours, so every stage is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//!                                 ┌─▶ compose ──▶ encode   (annotated .xlsx)
//! decode ──▶ metrics ─────────────┤
//! (xlsx)     (count, sheet, …)    └─▶ summary             (one-page .pdf)
//! ```
//!
//! 1. [`decode`]  : parse the uploaded workbook into a [`crate::TabularDocument`]
//! 2. [`metrics`] : count data rows in the first sheet and capture its shape
//! 3. [`compose`] : append the styled "Conteo URLs" sheet
//! 4. [`encode`]  : serialise the composed document back to XLSX
//! 5. [`summary`] : lay out the PDF summary from the metrics alone
//!
//! Stages 3+4 and 5 depend only on the metrics, so the orchestrator runs them
//! side by side.

pub mod compose;
pub mod decode;
pub mod encode;
pub mod metrics;
pub mod summary;
