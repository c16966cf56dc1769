//! Inputs and outputs of a report run.

use crate::pipeline::metrics::Metrics;
use serde::Serialize;

/// Uploaded files as `(name, raw bytes)`, in the order they were received.
///
/// Order matters: the input lookup is first-match-wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachments {
    entries: Vec<(String, Vec<u8>)>,
}

impl Attachments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file. A repeated name replaces the earlier body in place,
    /// matching how a JSON object treats duplicate keys.
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = bytes,
            None => self.entries.push((name, bytes)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(n, b)| (n.as_str(), b.as_slice()))
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, b)| b.as_slice())
    }

    /// First attachment whose name contains `pattern`, ignoring case.
    pub fn find_matching(&self, pattern: &str) -> Option<(&str, &[u8])> {
        self.iter().find(|(name, _)| name_matches(name, pattern))
    }
}

/// Whether an attachment called `name` is the crawl export: `name` contains
/// `pattern`, ignoring case.
pub fn name_matches(name: &str, pattern: &str) -> bool {
    name.to_lowercase().contains(&pattern.to_lowercase())
}

impl<N: Into<String>> FromIterator<(N, Vec<u8>)> for Attachments {
    fn from_iter<I: IntoIterator<Item = (N, Vec<u8>)>>(iter: I) -> Self {
        let mut attachments = Attachments::new();
        for (name, bytes) in iter {
            attachments.insert(name, bytes);
        }
        attachments
    }
}

/// Generated artifacts as `(file name, bytes)`, workbook first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedFiles {
    entries: Vec<(String, Vec<u8>)>,
}

impl GeneratedFiles {
    pub(crate) fn push(&mut self, name: String, bytes: Vec<u8>) {
        debug_assert!(self.get(&name).is_none(), "duplicate output name {name}");
        self.entries.push((name, bytes));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(n, b)| (n.as_str(), b.as_slice()))
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, b)| b.as_slice())
    }
}

impl IntoIterator for GeneratedFiles {
    type Item = (String, Vec<u8>);
    type IntoIter = std::vec::IntoIter<(String, Vec<u8>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Output file names derived from a base name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputNames {
    pub workbook: String,
    pub summary: String,
}

impl OutputNames {
    pub fn from_base(base: &str) -> Self {
        Self {
            workbook: format!("{base}_conteo_urls.xlsx"),
            summary: format!("{base}_conteo_urls.pdf"),
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct ReportOutput {
    pub url_count: u64,
    pub metrics: Metrics,
    pub names: OutputNames,
    pub files: GeneratedFiles,
}

impl ReportOutput {
    pub fn workbook(&self) -> Option<&[u8]> {
        self.files.get(&self.names.workbook)
    }

    pub fn summary(&self) -> Option<&[u8]> {
        self.files.get(&self.names.summary)
    }
}
