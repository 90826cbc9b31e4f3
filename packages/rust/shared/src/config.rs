//! Application configuration for mimegen.
//!
//! User config lives at `~/.mimegen/mimegen.toml`.
//! CLI flags override config file values, which override defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{MimegenError, Result};
use crate::source::Source;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "mimegen.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".mimegen";

/// Mailcap `mime.types`, the override source.
pub const DEFAULT_OVERRIDE_SOURCE: &str = "https://pagure.io/mailcap/raw/master/f/mime.types";

/// IANA media types registry document.
pub const DEFAULT_REGISTRY_SOURCE: &str =
    "https://www.iana.org/assignments/media-types/media-types.xhtml";

/// Base that registry template links are relative to.
pub const DEFAULT_TEMPLATE_PREFIX: &str = "https://www.iana.org/assignments/media-types/";

/// Detail pages fetched at once unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 100;

// ---------------------------------------------------------------------------
// Config structs (matching mimegen.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the two sources live.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Build tuning and output.
    #[serde(default)]
    pub build: BuildSection,
}

/// `[sources]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Override file location (URL or local path).
    #[serde(default = "default_override_source")]
    pub override_source: String,

    /// Registry document location (URL or local path).
    #[serde(default = "default_registry_source")]
    pub registry_source: String,

    /// Prefix used to resolve template links found in the registry.
    #[serde(default = "default_template_prefix")]
    pub template_prefix: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            override_source: default_override_source(),
            registry_source: default_registry_source(),
            template_prefix: default_template_prefix(),
        }
    }
}

fn default_override_source() -> String {
    DEFAULT_OVERRIDE_SOURCE.into()
}
fn default_registry_source() -> String {
    DEFAULT_REGISTRY_SOURCE.into()
}
fn default_template_prefix() -> String {
    DEFAULT_TEMPLATE_PREFIX.into()
}

/// `[build]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSection {
    /// Maximum detail-page fetches in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-request timeout. Unset means the HTTP client's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Directory artifacts are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Artifact formats to emit.
    #[serde(default = "default_emit")]
    pub emit: Vec<EmitFormat>,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            request_timeout_secs: None,
            output_dir: default_output_dir(),
            emit: default_emit(),
        }
    }
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}
fn default_output_dir() -> String {
    "generated".into()
}
fn default_emit() -> Vec<EmitFormat> {
    vec![EmitFormat::Rust, EmitFormat::Json]
}

// ---------------------------------------------------------------------------
// EmitFormat
// ---------------------------------------------------------------------------

/// Template identifier handed to the emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitFormat {
    /// Generated Rust source with a sorted lookup table.
    Rust,
    /// Plain JSON object, extension → media type.
    Json,
}

impl EmitFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Json => "json",
        }
    }

    /// File name the emitter writes for this format.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Rust => "generated.rs",
            Self::Json => "mime_types.json",
        }
    }
}

impl fmt::Display for EmitFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmitFormat {
    type Err = MimegenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rust" | "rs" => Ok(Self::Rust),
            "json" => Ok(Self::Json),
            other => Err(MimegenError::config(format!(
                "unknown emit format '{other}' (expected rust or json)"
            ))),
        }
    }
}

/// Parse a comma-separated list like `rust,json`.
pub fn parse_emit_list(list: &str) -> Result<Vec<EmitFormat>> {
    let mut formats = Vec::new();
    for part in list.split(',').filter(|p| !p.trim().is_empty()) {
        let format: EmitFormat = part.parse()?;
        if !formats.contains(&format) {
            formats.push(format);
        }
    }
    Ok(formats)
}

// ---------------------------------------------------------------------------
// Build config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime build configuration — resolved and validated from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub override_source: Source,
    pub registry_source: Source,
    pub template_prefix: Url,
    /// Maximum detail-page fetches in flight.
    pub concurrency: usize,
    pub request_timeout: Option<Duration>,
    pub output_dir: PathBuf,
    pub emit: Vec<EmitFormat>,
}

impl BuildConfig {
    /// Resolve sources and validate tuning values.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        let template_prefix = Url::parse(&config.sources.template_prefix).map_err(|e| {
            MimegenError::config(format!(
                "template_prefix '{}' is not a URL: {e}",
                config.sources.template_prefix
            ))
        })?;

        if config.build.concurrency == 0 {
            return Err(MimegenError::config("concurrency must be greater than zero"));
        }
        if config.build.emit.is_empty() {
            return Err(MimegenError::config("at least one emit format is required"));
        }

        Ok(Self {
            override_source: config.sources.override_source.parse()?,
            registry_source: config.sources.registry_source.parse()?,
            template_prefix,
            concurrency: config.build.concurrency,
            request_timeout: config.build.request_timeout_secs.map(Duration::from_secs),
            output_dir: PathBuf::from(&config.build.output_dir),
            emit: config.build.emit.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.mimegen/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| MimegenError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.mimegen/mimegen.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| MimegenError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| MimegenError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| MimegenError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| MimegenError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| MimegenError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("override_source"));
        assert!(toml_str.contains("media-types.xhtml"));
        assert!(!toml_str.contains("request_timeout_secs"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.build.concurrency, 100);
        assert_eq!(parsed.build.emit, vec![EmitFormat::Rust, EmitFormat::Json]);
        assert_eq!(parsed.sources.template_prefix, DEFAULT_TEMPLATE_PREFIX);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[sources]
override_source = "./mime.types"

[build]
concurrency = 8
emit = ["json"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.sources.override_source, "./mime.types");
        assert_eq!(config.sources.registry_source, DEFAULT_REGISTRY_SOURCE);
        assert_eq!(config.build.concurrency, 8);
        assert_eq!(config.build.output_dir, "generated");
        assert_eq!(config.build.emit, vec![EmitFormat::Json]);
    }

    #[test]
    fn build_config_from_defaults() {
        let build = BuildConfig::from_app_config(&AppConfig::default()).expect("valid");
        assert_eq!(build.concurrency, 100);
        assert!(build.request_timeout.is_none());
        assert!(matches!(build.override_source, Source::Remote(_)));
        assert_eq!(build.template_prefix.as_str(), DEFAULT_TEMPLATE_PREFIX);
    }

    #[test]
    fn build_config_rejects_zero_concurrency() {
        let mut app = AppConfig::default();
        app.build.concurrency = 0;
        let err = BuildConfig::from_app_config(&app).unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn build_config_rejects_bad_prefix() {
        let mut app = AppConfig::default();
        app.sources.template_prefix = "not a url".into();
        assert!(BuildConfig::from_app_config(&app).is_err());
    }

    #[test]
    fn emit_list_parsing() {
        assert_eq!(
            parse_emit_list("rust, json,rust").unwrap(),
            vec![EmitFormat::Rust, EmitFormat::Json]
        );
        assert!(parse_emit_list("yaml").is_err());
    }
}
