//! Configuration for a report run.
//!
//! Every knob lives in [`ReportConfig`], built via [`ReportConfigBuilder`].
//! The defaults reproduce the behaviour expected by the crawl automation that
//! uploads `internal_all.xlsx`, so most callers only ever set `base_name`.

use crate::error::ReportError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base name used for output files when the caller supplies none.
pub const DEFAULT_BASE_NAME: &str = "resultado";

/// Substring identifying the crawl export among the attachments.
pub const DEFAULT_INPUT_PATTERN: &str = "internal_all";

/// Value of the "Procesado por" row in the summary sheet.
pub const DEFAULT_PROCESSOR_LABEL: &str = "Vercel Processor Test";

/// Configuration for a single report run.
///
/// # Example
/// ```rust
/// use urlcount_report::ReportConfig;
///
/// let config = ReportConfig::builder()
///     .base_name("crawl1")
///     .build()
///     .unwrap();
/// assert_eq!(config.output_base_name(), "crawl1");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Caller-supplied label. Used as the output file prefix and as the
    /// "Rastreo" line in the PDF. Each use has its own fallback when absent.
    pub base_name: Option<String>,

    /// Case-insensitive substring that selects the input attachment.
    /// Default: `internal_all`.
    pub input_pattern: String,

    /// Processor name written into the summary sheet.
    pub processor_label: String,

    /// Freeze the processing timestamp. `None` means "now".
    ///
    /// Both artifacts read the timestamp from the same [`crate::Metrics`],
    /// so freezing it makes a run fully reproducible.
    pub processed_at: Option<DateTime<Utc>>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            base_name: None,
            input_pattern: DEFAULT_INPUT_PATTERN.to_string(),
            processor_label: DEFAULT_PROCESSOR_LABEL.to_string(),
            processed_at: None,
        }
    }
}

impl ReportConfig {
    /// Create a new builder for `ReportConfig`.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
        }
    }

    /// Prefix for the generated file names; empty counts as absent.
    pub fn output_base_name(&self) -> &str {
        match self.base_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => DEFAULT_BASE_NAME,
        }
    }

    /// Label for the PDF "Rastreo" line; empty counts as absent.
    pub fn trace_label(&self) -> Option<&str> {
        self.base_name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    pub fn base_name(mut self, name: impl Into<String>) -> Self {
        self.config.base_name = Some(name.into());
        self
    }

    /// Set or clear the base name from an optional value (handy for CLIs and
    /// request bodies where the field may be missing).
    pub fn maybe_base_name(mut self, name: Option<String>) -> Self {
        self.config.base_name = name;
        self
    }

    pub fn input_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.input_pattern = pattern.into();
        self
    }

    pub fn processor_label(mut self, label: impl Into<String>) -> Self {
        self.config.processor_label = label.into();
        self
    }

    pub fn processed_at(mut self, at: DateTime<Utc>) -> Self {
        self.config.processed_at = Some(at);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReportConfig, ReportError> {
        let c = &self.config;
        if c.input_pattern.trim().is_empty() {
            return Err(ReportError::InvalidConfig(
                "Input pattern must not be empty".into(),
            ));
        }
        if let Some(name) = &c.base_name {
            if name.contains(['/', '\\']) {
                return Err(ReportError::InvalidConfig(format!(
                    "Base name must not contain path separators, got '{name}'"
                )));
            }
        }
        Ok(self.config)
    }
}
