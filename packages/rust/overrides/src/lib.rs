//! Override source: the mailcap `mime.types` file.
//!
//! Its entries take unconditional priority over anything derived from the
//! registry. Failing to obtain the file aborts the build.

mod parser;

use mimegen_shared::{OverrideMap, Result, Source};
use reqwest::Client;
use tracing::{info, instrument};

pub use parser::parse_overrides;

/// Fetch (or read) the override file and parse it.
#[instrument(skip_all, fields(source = %source))]
pub async fn load_overrides(client: &Client, source: &Source) -> Result<OverrideMap> {
    let content = source.read_to_string(client).await?;
    let map = parse_overrides(&content);

    info!(extensions = map.len(), "override file parsed");

    Ok(map)
}
