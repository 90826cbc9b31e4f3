//! Shared types, error model, and configuration for mimegen.
//!
//! This crate is the foundation depended on by all other mimegen crates.
//! It provides:
//! - [`MimegenError`] — the unified error type
//! - Domain types ([`Record`], [`MergedMapping`], [`MimeTable`])
//! - Configuration ([`AppConfig`], [`BuildConfig`], config loading)
//! - Source locations and the shared HTTP client ([`Source`], [`build_client`])

pub mod config;
pub mod error;
pub mod source;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BuildConfig, BuildSection, DEFAULT_CONCURRENCY, DEFAULT_OVERRIDE_SOURCE,
    DEFAULT_REGISTRY_SOURCE, DEFAULT_TEMPLATE_PREFIX, EmitFormat, SourcesConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, parse_emit_list,
};
pub use error::{MimegenError, Result};
pub use source::{Source, build_client, fetch_required};
pub use types::{
    DEFAULT_MIME_TYPE, MergedMapping, MimeTable, OverrideMap, Record, RecordLabel, path_extension,
};
