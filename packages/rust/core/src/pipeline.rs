//! End-to-end build pipeline: sources → records → enrichment → merge → artifacts.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, instrument};

use mimegen_overrides::load_overrides;
use mimegen_registry::{EnrichStats, enrich_records, scrape_registry};
use mimegen_shared::{BuildConfig, Result, build_client};

use crate::emit::{self, ArtifactMeta, BuildManifest};
use crate::merge::{self, MergeOutcome};

/// Result of a completed build.
#[derive(Debug)]
pub struct BuildResult {
    /// The final mapping and the conflicts resolved along the way.
    pub outcome: MergeOutcome,
    /// Files written, in emit order.
    pub artifacts: Vec<ArtifactMeta>,
    pub output_dir: PathBuf,
    pub manifest_path: PathBuf,
    /// Extensions read from the override file.
    pub override_count: usize,
    /// Rows parsed from the registry document.
    pub record_count: usize,
    pub enrich: EnrichStats,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _result: &BuildResult) {}
}

/// Run the full build.
///
/// 1. Fetch the override file and the registry document concurrently
/// 2. Enrich registry records from their detail pages
/// 3. Merge, overrides first
/// 4. Emit every requested format and the manifest
///
/// Any fatal fetch failure returns before anything is written.
#[instrument(skip_all, fields(overrides = %config.override_source, registry = %config.registry_source))]
pub async fn build(config: &BuildConfig, progress: &dyn ProgressReporter) -> Result<BuildResult> {
    let start = Instant::now();
    let client = build_client(config.request_timeout)?;

    // --- Phase 1: Sources ---
    progress.phase("Fetching override file and registry");
    let (overrides, records) = tokio::try_join!(
        load_overrides(&client, &config.override_source),
        scrape_registry(&client, &config.registry_source, &config.template_prefix),
    )?;
    let record_count = records.len();

    // --- Phase 2: Enrichment ---
    progress.phase("Scanning detail pages for extensions");
    let (records, enrich) = enrich_records(&client, records, config.concurrency).await?;

    // --- Phase 3: Merge ---
    progress.phase("Merging");
    let outcome = merge::merge(&overrides, &records);

    // --- Phase 4: Emit ---
    progress.phase("Writing artifacts");
    let mut artifacts = Vec::with_capacity(config.emit.len());
    for format in &config.emit {
        artifacts.push(emit::emit(*format, &outcome.mapping, &config.output_dir)?);
    }

    let manifest = BuildManifest {
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        generated_at: Utc::now(),
        override_source: config.override_source.to_string(),
        registry_source: config.registry_source.to_string(),
        entries: outcome.mapping.len(),
        conflicts: outcome.conflicts.len(),
        artifacts: artifacts.clone(),
    };
    let manifest_path = emit::write_manifest(&config.output_dir, &manifest)?;

    let result = BuildResult {
        outcome,
        artifacts,
        output_dir: config.output_dir.clone(),
        manifest_path,
        override_count: overrides.len(),
        record_count,
        enrich,
        elapsed: start.elapsed(),
    };

    info!(
        entries = result.outcome.mapping.len(),
        conflicts = result.outcome.conflicts.len(),
        records = result.record_count,
        elapsed_ms = result.elapsed.as_millis(),
        "build complete"
    );

    progress.done(&result);

    Ok(result)
}
