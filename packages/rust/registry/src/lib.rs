//! Media types registry scraping and detail-page enrichment.
//!
//! This crate provides:
//! - [`scrape`] — parses the registry document into [`Record`]s
//! - [`enrich`] — fills each record's extensions from its detail page
//!
//! [`Record`]: mimegen_shared::Record

pub mod enrich;
pub mod scrape;

pub use enrich::{EnrichStats, enrich_records, extract_extensions};
pub use scrape::{RegistryRow, RowTriples, parse_registry, registry_rows, scrape_registry};
