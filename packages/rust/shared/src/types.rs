//! Core domain types for the mimegen build and its lookup table.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{MimegenError, Result};

/// Media type returned when an extension is unknown.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Extension (no leading dot) → media type, as read from the override file.
pub type OverrideMap = BTreeMap<String, String>;

/// Final extension → media type table produced by a build.
///
/// Ordered so that emitted artifacts are byte-stable between runs.
pub type MergedMapping = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One registry row, later enriched with extensions from its detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// Free-text label from the first cell of the row.
    pub internal_name: String,
    /// Top-level type, e.g. `application`. Empty when the row had no template.
    pub type_: String,
    /// Subtype, e.g. `pdf`.
    pub sub_type: String,
    /// Per-type description page, if the template cell linked one.
    pub detail_ref: Option<Url>,
    /// Extensions without a leading dot, in the order they were found.
    pub extensions: Vec<String>,
}

impl Record {
    /// Start a new record for the given row label.
    pub fn new(internal_name: impl Into<String>) -> Self {
        Self {
            internal_name: internal_name.into(),
            ..Self::default()
        }
    }

    /// `type/subtype`, the value merged for each of this record's extensions.
    pub fn media_type(&self) -> String {
        format!("{}/{}", self.type_, self.sub_type)
    }

    /// Whether the template cell was filled in.
    pub fn has_template(&self) -> bool {
        !self.type_.is_empty()
    }

    pub fn label(&self) -> RecordLabel {
        RecordLabel {
            internal_name: self.internal_name.clone(),
            media_type: self.media_type(),
        }
    }
}

/// Identifies a record in conflict reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLabel {
    pub internal_name: String,
    pub media_type: String,
}

impl fmt::Display for RecordLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.internal_name, self.media_type)
    }
}

// ---------------------------------------------------------------------------
// MimeTable
// ---------------------------------------------------------------------------

/// Read-only lookup over a built mapping.
#[derive(Debug, Clone, Default)]
pub struct MimeTable {
    entries: MergedMapping,
}

impl MimeTable {
    pub fn new(entries: MergedMapping) -> Self {
        Self { entries }
    }

    /// Load a table written by the JSON emitter.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| MimegenError::io(path, e))?;
        let entries: MergedMapping = serde_json::from_str(&content).map_err(|e| {
            MimegenError::validation(format!("invalid table {}: {e}", path.display()))
        })?;
        Ok(Self { entries })
    }

    /// Media type for an extension given without its leading dot.
    ///
    /// Matching is case-sensitive, like the table keys.
    pub fn detect_file_ext(&self, ext: &str) -> &str {
        self.entries
            .get(ext)
            .map(String::as_str)
            .unwrap_or(DEFAULT_MIME_TYPE)
    }

    /// Media type for a `/`-separated path, keyed by its extension.
    pub fn detect_file_path(&self, path: &str) -> &str {
        self.detect_file_ext(path_extension(path))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Text after the last `.` in the final path component, or `""`.
///
/// `"/a/b/file.PDF"` gives `"PDF"`; `"/a.d/file"` gives `""`.
pub fn path_extension(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) => &name[idx + 1..],
        None => "",
    }
}
