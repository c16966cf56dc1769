//! CLI binary for urlcount-report.
//!
//! A thin shim over the library crate: maps flags to `ReportConfig`, runs
//! either the JSON transport adapter or the pipeline on local files, and
//! prints results.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use urlcount_report::process::write_outputs;
use urlcount_report::{
    process, process_file, transport, Attachments, Metrics, ReportConfig, ReportOutput,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Count URLs in a crawl export and write both reports to ./out
  urlcount run internal_all.xlsx -o out --base-name crawl1

  # Several exports at once: the first name containing "internal_all" wins
  urlcount run crawl/*.xlsx -o out

  # Answer a JSON request body (fileContents = name → base64) on stdout
  urlcount request body.json
  cat body.json | urlcount request -

  # Health check, as a GET would
  urlcount request --method GET

OUTPUT FILES:
  {base}_conteo_urls.xlsx   original workbook + "Conteo URLs" sheet
  {base}_conteo_urls.pdf    one-page summary
  {base} defaults to "resultado".

ENVIRONMENT VARIABLES:
  URLCOUNT_BASE_NAME        Default --base-name
  URLCOUNT_INPUT_PATTERN    Substring that selects the input attachment
  URLCOUNT_PROCESSOR_LABEL  Value of the "Procesado por" row
  RUST_LOG                  Overrides the log filter
"#;

/// Count URLs in crawl export workbooks and produce XLSX + PDF reports.
#[derive(Parser, Debug)]
#[command(
    name = "urlcount",
    version,
    about = "Count URLs in a crawl export workbook and produce XLSX + PDF reports",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Substring (case-insensitive) identifying the crawl export.
    #[arg(long, global = true, env = "URLCOUNT_INPUT_PATTERN", default_value = "internal_all")]
    input_pattern: String,

    /// Value written to the "Procesado por" row.
    #[arg(long, global = true, env = "URLCOUNT_PROCESSOR_LABEL")]
    processor_label: Option<String>,

    /// Freeze the processing timestamp (RFC 3339, e.g. 2026-10-19T08:30:00Z).
    #[arg(long, global = true)]
    processed_at: Option<DateTime<Utc>>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "URLCOUNT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "URLCOUNT_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process local workbook(s) and write both reports to a directory.
    Run {
        /// One workbook, or several from which the input is picked by name.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for the generated files.
        #[arg(short, long, env = "URLCOUNT_OUTPUT_DIR", default_value = ".")]
        output: PathBuf,

        /// Prefix for the output file names and the PDF "Rastreo" line.
        #[arg(short, long, env = "URLCOUNT_BASE_NAME")]
        base_name: Option<String>,

        /// Print metrics and written paths as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Answer a JSON request body the way the HTTP endpoint does.
    Request {
        /// Path to the JSON body, or `-` for stdin. Not needed for GET.
        body: Option<PathBuf>,

        /// Request method (GET, POST, …).
        #[arg(long, default_value = "POST")]
        method: String,

        /// Pretty-print the JSON response.
        #[arg(long)]
        pretty: bool,
    },
}

/// JSON summary printed by `run --json`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary<'a> {
    url_count: u64,
    metrics: &'a Metrics,
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Run {
            inputs,
            output,
            base_name,
            json,
        } => {
            let config = build_config(&cli, base_name.clone())?;
            let report = run_inputs(inputs, &config).await?;
            write_outputs(&report, output)
                .await
                .context("Failed to write reports")?;

            let written: Vec<PathBuf> = report.files.names().map(|n| output.join(n)).collect();
            if *json {
                let summary = RunSummary {
                    url_count: report.url_count,
                    metrics: &report.metrics,
                    files: written,
                };
                println!(
                    "{}",
                    serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
                );
            } else if !cli.quiet {
                eprintln!(
                    "{} {} URLs encontradas  {}",
                    green("✔"),
                    bold(&report.url_count.to_string()),
                    dim(&format!(
                        "hoja '{}', {} columnas",
                        report.metrics.source_sheet_name, report.metrics.column_count
                    )),
                );
                for path in written {
                    eprintln!("   → {}", bold(&path.display().to_string()));
                }
            }
        }

        Command::Request {
            body,
            method,
            pretty,
        } => {
            let config = build_config(&cli, None)?;
            let body = match body {
                Some(path) => read_body(path)?,
                None => String::new(),
            };

            let response = transport::handle(method.as_str(), &body, &config).await;
            if *pretty {
                let value: serde_json::Value = serde_json::from_str(&response.to_json())
                    .context("Failed to re-parse response")?;
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{}", response.to_json());
            }

            if !response.is_success() {
                if !cli.quiet {
                    eprintln!("{} status {}", red("✘"), response.status);
                }
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Map CLI args to `ReportConfig`.
fn build_config(cli: &Cli, base_name: Option<String>) -> Result<ReportConfig> {
    let mut builder = ReportConfig::builder()
        .maybe_base_name(base_name)
        .input_pattern(cli.input_pattern.clone());

    if let Some(ref label) = cli.processor_label {
        builder = builder.processor_label(label.clone());
    }
    if let Some(at) = cli.processed_at {
        builder = builder.processed_at(at);
    }

    builder.build().context("Invalid configuration")
}

/// A single path is processed as-is; several go through the name lookup.
async fn run_inputs(inputs: &[PathBuf], config: &ReportConfig) -> Result<ReportOutput> {
    if let [single] = inputs {
        return process_file(single, config)
            .await
            .with_context(|| format!("Failed to process {}", single.display()));
    }

    let mut attachments = Attachments::new();
    for path in inputs {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        attachments.insert(name, bytes);
    }

    process(&attachments, config)
        .await
        .context("Failed to process attachments")
}

/// Read a request body from a file, or stdin for `-`.
fn read_body(path: &PathBuf) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut body = String::new();
        io::stdin()
            .read_to_string(&mut body)
            .context("Failed to read request body from stdin")?;
        Ok(body)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request body from {:?}", path))
    }
}
