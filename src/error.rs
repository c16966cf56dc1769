//! Error type for the urlcount-report library.
//!
//! Every failure aborts the pipeline: there is no partial output and nothing
//! is retried. The variants fall into two groups that the transport adapter
//! maps to different status codes:
//!
//! * **Client errors**: the request itself is unusable (no attachments,
//!   the crawl export is missing, the workbook is corrupt or empty, the
//!   options are invalid). Reported back verbatim; resubmitting the same
//!   request will fail again.
//!
//! * **Internal errors**: producing one of the output artifacts failed.
//!   Reported with detail under an `Error interno:` prefix.
//!
//! Messages are in Spanish because they are shown to the uploader as-is.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the urlcount-report library.
#[derive(Debug, Error)]
pub enum ReportError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No attachments were supplied at all.
    #[error(
        "No se recibieron archivos. Asegurate de activar \"Enviar contenido de archivos\" \
         en la configuracion del procesador."
    )]
    MissingAttachments,

    /// None of the attachment names matched the input pattern.
    ///
    /// `received` lists every name that *was* supplied, in request order.
    #[error(
        "No se encontro {pattern}.xlsx en los archivos enviados. Archivos recibidos: {}",
        .received.join(", ")
    )]
    InputFileNotFound {
        pattern: String,
        received: Vec<String>,
    },

    /// A local input workbook could not be read.
    #[error("Failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An attachment body was not valid base64.
    #[error("El archivo '{file}' no esta codificado en base64 valido: {detail}")]
    InvalidEncoding { file: String, detail: String },

    /// The bytes could not be parsed as an XLSX workbook.
    #[error("El archivo '{file}' no es un Excel valido: {detail}")]
    MalformedDocument { file: String, detail: String },

    /// The workbook parsed but contains no sheets.
    #[error("El archivo Excel no tiene hojas")]
    EmptyDocument { file: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Writing the annotated workbook failed.
    #[error("No se pudo generar el Excel: {0}")]
    Serialization(String),

    /// Rendering the summary PDF failed.
    #[error("No se pudo generar el PDF: {0}")]
    Render(String),

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReportError {
    /// True when the request itself is at fault (HTTP 4xx territory).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ReportError::MissingAttachments
                | ReportError::InputFileNotFound { .. }
                | ReportError::InputReadFailed { .. }
                | ReportError::InvalidEncoding { .. }
                | ReportError::MalformedDocument { .. }
                | ReportError::EmptyDocument { .. }
                | ReportError::InvalidConfig(_)
        )
    }

    /// HTTP status a transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }
}
