//! Report entry points: attachments in, annotated workbook + PDF out.
//!
//! A run is single-pass and all-or-nothing. Every step can fail, and the
//! first failure aborts the run with no artifacts returned:
//!
//! | Step | Failure | Kind |
//! |------|---------|------|
//! | 1. attachments present | [`ReportError::MissingAttachments`] | client |
//! | 2. locate input by name | [`ReportError::InputFileNotFound`] | client |
//! | 3. decode workbook | [`ReportError::MalformedDocument`] | client |
//! | 4. at least one sheet | [`ReportError::EmptyDocument`] | client |
//! | 5. extract metrics | n/a | |
//! | 6. compose + encode | [`ReportError::Serialization`] | internal |
//! | 7. render summary | [`ReportError::Render`] | internal |
//!
//! Decoding, encoding and rendering are CPU-bound, so they run on tokio's
//! blocking pool. Steps 6 and 7 only share the metrics and run side by side.

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::output::{Attachments, GeneratedFiles, OutputNames, ReportOutput};
use crate::pipeline::{compose, decode, encode, metrics, summary};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Produce the report for the crawl export found among `attachments`.
///
/// The input is the first attachment whose name contains
/// `config.input_pattern` (default `internal_all`), ignoring case.
///
/// # Example
/// ```rust,no_run
/// use urlcount_report::{process, Attachments, ReportConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut attachments = Attachments::new();
/// attachments.insert("internal_all.xlsx", std::fs::read("internal_all.xlsx")?);
///
/// let config = ReportConfig::builder().base_name("crawl1").build()?;
/// let output = process(&attachments, &config).await?;
/// println!("{} URLs", output.url_count);
/// # Ok(())
/// # }
/// ```
pub async fn process(
    attachments: &Attachments,
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    // ── Step 1: Attachments present ──────────────────────────────────────
    if attachments.is_empty() {
        return Err(ReportError::MissingAttachments);
    }

    // ── Step 2: Locate the crawl export ──────────────────────────────────
    let (file_name, bytes) = locate_input(attachments, &config.input_pattern)?;
    info!(
        "Processing '{}' ({} bytes) out of {} attachment(s)",
        file_name,
        bytes.len(),
        attachments.len()
    );

    run(file_name.to_string(), bytes.to_vec(), config).await
}

/// Produce the report for a single local workbook, skipping the name lookup.
pub async fn process_file(
    path: impl AsRef<Path>,
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ReportError::InputReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    info!("Processing '{}' ({} bytes)", path.display(), bytes.len());
    run(file_name, bytes, config).await
}

/// Run [`process`] and write both artifacts into `dir`.
///
/// Either both files end up in `dir` or neither does; see [`write_outputs`].
pub async fn process_to_dir(
    attachments: &Attachments,
    dir: impl AsRef<Path>,
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    let output = process(attachments, config).await?;
    write_outputs(&output, dir.as_ref()).await?;
    Ok(output)
}

/// Synchronous wrapper around [`process`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_sync(
    attachments: &Attachments,
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReportError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process(attachments, config))
}

/// Find the first attachment whose name contains `pattern`, ignoring case.
///
/// On a miss the error lists every received name, in order.
pub fn locate_input<'a>(
    attachments: &'a Attachments,
    pattern: &str,
) -> Result<(&'a str, &'a [u8]), ReportError> {
    attachments
        .find_matching(pattern)
        .ok_or_else(|| input_not_found(pattern, attachments.names()))
}

/// The miss error for [`locate_input`], listing `received` in order.
pub(crate) fn input_not_found<'a>(
    pattern: &str,
    received: impl IntoIterator<Item = &'a str>,
) -> ReportError {
    let received: Vec<String> = received.into_iter().map(str::to_string).collect();
    warn!("No attachment matches '{}'; received {:?}", pattern, received);
    ReportError::InputFileNotFound {
        pattern: pattern.to_string(),
        received,
    }
}

/// Write every generated file into `dir` (created if missing).
///
/// All files are first written to `.{name}.tmp` siblings and only then
/// renamed into place. On failure the temporaries, and any output this call
/// already renamed, are removed again.
pub async fn write_outputs(output: &ReportOutput, dir: &Path) -> Result<(), ReportError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ReportError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    // ── Stage ────────────────────────────────────────────────────────────
    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(output.files.len());
    for (name, bytes) in output.files.iter() {
        let path = dir.join(name);
        let tmp_path = dir.join(format!(".{name}.tmp"));
        let written = tokio::fs::write(&tmp_path, bytes).await;
        staged.push((tmp_path, path.clone()));

        if let Err(e) = written {
            discard(&staged, &[]).await;
            return Err(ReportError::OutputWriteFailed { path, source: e });
        }
    }

    // ── Commit ───────────────────────────────────────────────────────────
    for (i, (tmp_path, path)) in staged.iter().enumerate() {
        if let Err(e) = tokio::fs::rename(tmp_path, path).await {
            discard(&staged[i..], &staged[..i]).await;
            return Err(ReportError::OutputWriteFailed {
                path: path.clone(),
                source: e,
            });
        }
        debug!("Wrote {}", path.display());
    }
    Ok(())
}

/// Remove the temporaries still `pending` and the outputs already `placed`.
async fn discard(pending: &[(PathBuf, PathBuf)], placed: &[(PathBuf, PathBuf)]) {
    let leftovers = pending
        .iter()
        .map(|(tmp, _)| tmp)
        .chain(placed.iter().map(|(_, path)| path));
    for path in leftovers {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Could not remove {}: {}", path.display(), e);
            }
        }
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Steps 3–8 for an already-located input.
async fn run(
    file_name: String,
    bytes: Vec<u8>,
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    let total_start = Instant::now();

    // ── Step 3: Decode ───────────────────────────────────────────────────
    let decode_name = file_name.clone();
    let doc = join_stage(
        "decode",
        tokio::task::spawn_blocking(move || decode::decode_workbook(&bytes, &decode_name)),
    )
    .await?;

    // ── Step 4: At least one sheet ───────────────────────────────────────
    if doc.is_empty() {
        return Err(ReportError::EmptyDocument { file: file_name });
    }

    // ── Step 5: Metrics ──────────────────────────────────────────────────
    let processed_at = config.processed_at.unwrap_or_else(Utc::now);
    let metrics = metrics::extract_metrics(&doc, &file_name, processed_at)?;
    debug!(
        "First sheet '{}': {} URLs, {} columns",
        metrics.source_sheet_name, metrics.url_count, metrics.column_count
    );

    // ── Steps 6 + 7: Workbook and summary, concurrently ──────────────────
    let workbook_metrics = metrics.clone();
    let processor_label = config.processor_label.clone();
    let workbook_task = tokio::task::spawn_blocking(move || {
        let composed = compose::compose_report(&doc, &workbook_metrics, &processor_label);
        encode::encode_workbook(&composed)
    });

    let summary_metrics = metrics.clone();
    let trace_label = config.trace_label().map(str::to_string);
    let summary_task = tokio::task::spawn_blocking(move || {
        summary::render_summary(&summary_metrics, trace_label.as_deref())
    });

    let (workbook, pdf) = tokio::try_join!(
        join_stage("workbook", workbook_task),
        join_stage("summary", summary_task),
    )?;

    // ── Step 8: Package ──────────────────────────────────────────────────
    let names = OutputNames::from_base(config.output_base_name());
    let mut files = GeneratedFiles::default();
    files.push(names.workbook.clone(), workbook);
    files.push(names.summary.clone(), pdf);

    info!(
        "Procesado completado: {} URLs encontradas ({}ms)",
        metrics.url_count,
        total_start.elapsed().as_millis()
    );

    Ok(ReportOutput {
        url_count: metrics.url_count,
        metrics,
        names,
        files,
    })
}

/// Await a blocking stage, turning a panic into [`ReportError::Internal`].
async fn join_stage<T>(
    stage: &str,
    handle: JoinHandle<Result<T, ReportError>>,
) -> Result<T, ReportError> {
    handle
        .await
        .map_err(|e| ReportError::Internal(format!("{stage} task panicked: {e}")))?
}
