//! Artifact emission.
//!
//! Serializes a [`MergedMapping`] into one of the static [`EmitFormat`]s and
//! records what was written in `manifest.json`.
//!
//! ```text
//! <output_dir>/
//! ├── generated.rs       (EmitFormat::Rust)
//! ├── mime_types.json    (EmitFormat::Json)
//! └── manifest.json
//! ```

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use mimegen_shared::{DEFAULT_MIME_TYPE, EmitFormat, MergedMapping, MimegenError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

/// Name of the build manifest inside the output directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Metadata for a single emitted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub format: EmitFormat,
    pub filename: String,
    pub sha256: String,
    pub size_bytes: usize,
}

/// The `manifest.json` written next to the artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildManifest {
    /// Tool version that produced the artifacts.
    pub tool_version: String,
    pub generated_at: DateTime<Utc>,
    pub override_source: String,
    pub registry_source: String,
    /// Number of extensions in the mapping.
    pub entries: usize,
    /// Number of registry conflicts resolved first-wins.
    pub conflicts: usize,
    pub artifacts: Vec<ArtifactMeta>,
}

/// Render the mapping in the given format.
pub fn render(format: EmitFormat, mapping: &MergedMapping) -> Result<String> {
    match format {
        EmitFormat::Rust => render_rust(mapping)
            .map_err(|e| MimegenError::Emit(format!("Rust template rendering failed: {e}"))),
        EmitFormat::Json => render_json(mapping),
    }
}

/// Write one artifact into `out_dir`, replacing any previous copy.
#[instrument(skip_all, fields(format = %format, out_dir = %out_dir.display()))]
pub fn emit(format: EmitFormat, mapping: &MergedMapping, out_dir: &Path) -> Result<ArtifactMeta> {
    std::fs::create_dir_all(out_dir).map_err(|e| MimegenError::io(out_dir, e))?;

    let content = render(format, mapping)?;
    let filename = format.file_name();
    write_atomic(&out_dir.join(filename), &content)?;

    let meta = ArtifactMeta {
        format,
        filename: filename.to_string(),
        sha256: sha256_hex(&content),
        size_bytes: content.len(),
    };

    info!(file = %meta.filename, entries = mapping.len(), size = meta.size_bytes, "artifact written");

    Ok(meta)
}

/// Write `manifest.json` into `out_dir`.
pub fn write_manifest(out_dir: &Path, manifest: &BuildManifest) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(manifest)
        .map_err(|e| MimegenError::Emit(format!("manifest serialization failed: {e}")))?;

    let path = out_dir.join(MANIFEST_FILE_NAME);
    write_atomic(&path, &json)?;
    debug!(path = %path.display(), "wrote manifest");

    Ok(path)
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

fn render_json(mapping: &MergedMapping) -> Result<String> {
    let mut json = serde_json::to_string_pretty(mapping)
        .map_err(|e| MimegenError::Emit(format!("JSON serialization failed: {e}")))?;
    json.push('\n');
    Ok(json)
}

/// Generated Rust module with a sorted table and binary-search lookups.
fn render_rust(mapping: &MergedMapping) -> std::result::Result<String, fmt::Error> {
    let mut out = String::with_capacity(64 + mapping.len() * 48);

    writeln!(
        out,
        "// @generated by mimegen {}. Do not edit.",
        env!("CARGO_PKG_VERSION")
    )?;
    out.push('\n');
    out.push_str("/// Media type returned for unknown extensions.\n");
    writeln!(out, "pub const DEFAULT_MIME_TYPE: &str = {DEFAULT_MIME_TYPE:?};")?;
    out.push('\n');
    out.push_str("/// Extension (no leading dot) → media type, sorted by extension.\n");
    out.push_str("pub static EXTENSION_TO_MIME: &[(&str, &str)] = &[\n");
    // BTreeMap iteration order is the byte order binary_search relies on.
    for (ext, media_type) in mapping {
        writeln!(out, "    ({ext:?}, {media_type:?}),")?;
    }
    out.push_str("];\n");
    out.push_str(RUST_LOOKUP_FNS);

    Ok(out)
}

const RUST_LOOKUP_FNS: &str = r#"
/// Media type for an extension given without its leading dot.
pub fn detect_file_ext(ext: &str) -> &'static str {
    match EXTENSION_TO_MIME.binary_search_by(|(key, _)| (*key).cmp(ext)) {
        Ok(idx) => EXTENSION_TO_MIME[idx].1,
        Err(_) => DEFAULT_MIME_TYPE,
    }
}

/// Media type for a `/`-separated path, keyed by its extension.
pub fn detect_file_path(path: &str) -> &'static str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) => detect_file_ext(&name[idx + 1..]),
        None => DEFAULT_MIME_TYPE,
    }
}
"#;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Write to a temp file next to `target`, then rename over it.
fn write_atomic(target: &Path, content: &str) -> Result<()> {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = target.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| MimegenError::io(&temp, e))?;
    std::fs::rename(&temp, target).map_err(|e| MimegenError::io(target, e))?;

    Ok(())
}

fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
