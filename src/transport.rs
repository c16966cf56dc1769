//! JSON/base64 request adapter.
//!
//! The core pipeline exchanges raw bytes and typed errors. Callers reach it
//! through an HTTP-style envelope instead: a JSON body whose `fileContents`
//! maps file names to base64 strings, answered with a JSON body and a status
//! code. This module owns that envelope and nothing else. It never binds a
//! socket; a host framework (or the `urlcount` binary) feeds it a method and
//! a body and writes back the [`Response`].
//!
//! ```text
//! GET  → 200 {"status":"ok","message":"SF Automation Processor Test"}
//! POST → 200 {"success":true,"message":…,"urlCount":N,"generatedFiles":{…}}
//!      → 400 {"success":false,"error":"<client error>"}
//!      → 500 {"success":false,"error":"Error interno: <detail>"}
//! *    → 405 {"error":"Method not allowed"}
//! ```

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::output::{name_matches, Attachments, GeneratedFiles, ReportOutput};
use crate::process::{input_not_found, process};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info};

/// Message returned by the health check.
pub const HEALTH_MESSAGE: &str = "SF Automation Processor Test";

/// Standard alphabet, padding optional on input, always padded on output.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Request method, as far as this adapter cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other(String),
}

impl From<&str> for Method {
    fn from(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            _ => Method::Other(s.to_string()),
        }
    }
}

/// Body of a `POST`.
///
/// Unknown fields (the automation also sends a `files` list) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    #[serde(default)]
    pub base_name: Option<String>,

    /// Kept as raw JSON so a missing or non-object value can be reported as
    /// [`ReportError::MissingAttachments`] rather than a parse failure.
    #[serde(default)]
    pub file_contents: Option<Value>,
}

/// Body of a `POST` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_count: Option<u64>,
    /// Output file name → base64 content, workbook first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_files: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Any response body this adapter produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Health { status: String, message: String },
    Process(ProcessResponse),
    Rejected { error: String },
}

/// Status code plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: ResponseBody,
}

impl Response {
    pub fn to_json(&self) -> String {
        // ResponseBody only holds strings, numbers, bools and JSON maps.
        serde_json::to_string(&self.body).unwrap_or_else(|e| {
            format!(r#"{{"success":false,"error":"Error interno: {e}"}}"#)
        })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Dispatch one request. `body` is ignored for anything but `POST`.
pub async fn handle(method: impl Into<Method>, body: &str, config: &ReportConfig) -> Response {
    match method.into() {
        Method::Get => health(),
        Method::Post => match serde_json::from_str::<ProcessRequest>(body) {
            Ok(request) => handle_process(request, config).await,
            Err(e) => Response {
                status: 400,
                body: ResponseBody::Process(ProcessResponse::failure(format!(
                    "Cuerpo de la peticion invalido: {e}"
                ))),
            },
        },
        Method::Other(m) => {
            info!("Rejecting method {}", m);
            Response {
                status: 405,
                body: ResponseBody::Rejected {
                    error: "Method not allowed".to_string(),
                },
            }
        }
    }
}

/// The `GET` health check.
pub fn health() -> Response {
    Response {
        status: 200,
        body: ResponseBody::Health {
            status: "ok".to_string(),
            message: HEALTH_MESSAGE.to_string(),
        },
    }
}

/// Run the pipeline for a parsed `POST` body.
///
/// `config` supplies everything except the base name, which comes from the
/// request.
pub async fn handle_process(request: ProcessRequest, config: &ReportConfig) -> Response {
    let config = ReportConfig {
        base_name: request.base_name.clone(),
        ..config.clone()
    };

    match run_request(&request, &config).await {
        Ok(output) => Response {
            status: 200,
            body: ResponseBody::Process(ProcessResponse {
                success: true,
                message: Some(format!(
                    "Procesado completado: {} URLs encontradas",
                    output.url_count
                )),
                url_count: Some(output.url_count),
                generated_files: Some(encode_files(&output.files)),
                error: None,
            }),
        },
        Err(e) => failure(&e),
    }
}

async fn run_request(
    request: &ProcessRequest,
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    let attachments = select_attachment(request.file_contents.as_ref(), &config.input_pattern)?;
    process(&attachments, config).await
}

/// Pick the crawl export out of `fileContents` and decode it.
///
/// The first key containing `pattern` (ignoring case, in request order) is
/// the input. Only that entry is base64-decoded; the other entries are never
/// looked at beyond their names. Absent, non-object and empty values all
/// count as "no attachments".
pub fn select_attachment(
    file_contents: Option<&Value>,
    pattern: &str,
) -> Result<Attachments, ReportError> {
    let map = match file_contents {
        Some(Value::Object(map)) if !map.is_empty() => map,
        _ => return Err(ReportError::MissingAttachments),
    };

    let (name, value) = map
        .iter()
        .find(|(name, _)| name_matches(name, pattern))
        .ok_or_else(|| input_not_found(pattern, map.keys().map(String::as_str)))?;

    let Value::String(encoded) = value else {
        return Err(ReportError::InvalidEncoding {
            file: name.clone(),
            detail: "expected a base64 string".to_string(),
        });
    };

    let mut attachments = Attachments::new();
    attachments.insert(name.clone(), decode_base64(name, encoded)?);
    Ok(attachments)
}

/// Decode one attachment body, ignoring embedded whitespace and padding.
pub fn decode_base64(name: &str, encoded: &str) -> Result<Vec<u8>, ReportError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    BASE64
        .decode(compact.as_bytes())
        .map_err(|e| ReportError::InvalidEncoding {
            file: name.to_string(),
            detail: e.to_string(),
        })
}

/// Base64-encode generated files, preserving their order.
pub fn encode_files(files: &GeneratedFiles) -> Map<String, Value> {
    files
        .iter()
        .map(|(name, bytes)| (name.to_string(), Value::String(BASE64.encode(bytes))))
        .collect()
}

/// Map a pipeline error to a failure response.
pub fn failure(err: &ReportError) -> Response {
    let status = err.status_code();
    let message = if err.is_client_error() {
        err.to_string()
    } else {
        error!("Error procesando: {}", err);
        format!("Error interno: {err}")
    };
    Response {
        status,
        body: ResponseBody::Process(ProcessResponse::failure(message)),
    }
}

impl ProcessResponse {
    fn failure(error: String) -> Self {
        Self {
            success: false,
            message: None,
            url_count: None,
            generated_files: None,
            error: Some(error),
        }
    }
}
