//! Detail-page enrichment.
//!
//! Each record with a detail page is moved into its own task, which fetches
//! the page, appends the extensions it mentions and hands the record back.
//! A semaphore bounds the fetches in flight and the `JoinSet` is the barrier
//! the merge waits on.

use std::sync::{Arc, LazyLock};

use mimegen_shared::{MimegenError, Record, Result};
use regex::Regex;
use reqwest::Client;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// A dot followed by word characters, e.g. `.pdf`.
static FILE_EXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[A-Za-z0-9_]+").expect("file extension regex"));

/// Counts reported once the barrier is passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStats {
    /// Records that had a detail page and were fetched.
    pub submitted: usize,
    /// Detail pages that answered with a non-success status.
    pub skipped: usize,
    /// Records that came back with at least one extension.
    pub with_extensions: usize,
}

/// Extensions mentioned on lines that talk about extensions.
///
/// Only lines containing `Extension` or `extension` are considered; the
/// leading dot is stripped.
pub fn extract_extensions(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|line| line.contains("Extension") || line.contains("extension"))
        .flat_map(|line| FILE_EXT_RE.find_iter(line))
        .map(|m| m.as_str().trim_start_matches('.').to_string())
        .collect()
}

/// Enrich every record that links a detail page, at most `concurrency` at a time.
///
/// Records come back in their original order. A detail page answering with
/// a non-success status leaves its record without extensions; a transport
/// failure aborts the whole run and cancels the remaining tasks. A
/// `concurrency` of zero is a config error.
#[instrument(skip_all, fields(records = records.len(), concurrency = concurrency))]
pub async fn enrich_records(
    client: &Client,
    records: Vec<Record>,
    concurrency: usize,
) -> Result<(Vec<Record>, EnrichStats)> {
    if concurrency == 0 {
        return Err(MimegenError::config("concurrency must be greater than zero"));
    }

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut slots: Vec<Option<Record>> = Vec::with_capacity(records.len());
    let mut tasks = JoinSet::new();
    let mut stats = EnrichStats::default();

    for (idx, record) in records.into_iter().enumerate() {
        let Some(url) = record.detail_ref.clone() else {
            slots.push(Some(record));
            continue;
        };

        slots.push(None);
        stats.submitted += 1;

        let client = client.clone();
        let sem = semaphore.clone();

        tasks.spawn(async move {
            let _permit = sem
                .acquire_owned()
                .await
                .map_err(|e| MimegenError::Enrichment(format!("worker pool closed: {e}")))?;

            let (record, fetched) = detect_suffixes(&client, &url, record).await?;
            Ok::<_, MimegenError>((idx, record, fetched))
        });
    }

    info!(submitted = stats.submitted, "detail page fetches queued");

    while let Some(joined) = tasks.join_next().await {
        let (idx, record, fetched) = joined
            .map_err(|e| MimegenError::Enrichment(format!("enrichment task failed: {e}")))??;

        if !fetched {
            stats.skipped += 1;
        }
        if !record.extensions.is_empty() {
            stats.with_extensions += 1;
        }
        slots[idx] = Some(record);
    }

    info!(
        submitted = stats.submitted,
        skipped = stats.skipped,
        with_extensions = stats.with_extensions,
        "enrichment complete"
    );

    Ok((slots.into_iter().flatten().collect(), stats))
}

/// Fetch one record's detail page and append its extensions.
///
/// Returns `false` alongside the untouched record when the page answered
/// with a non-success status.
async fn detect_suffixes(client: &Client, url: &Url, mut record: Record) -> Result<(Record, bool)> {
    debug!(name = %record.internal_name, %url, "fetching detail page");

    let response = client.get(url.as_str()).send().await.map_err(|e| {
        MimegenError::Network(format!("media type {}: {url}: {e}", record.internal_name))
    })?;

    let status = response.status();
    if !status.is_success() {
        warn!(name = %record.internal_name, %url, %status, "detail page unavailable, skipping");
        return Ok((record, false));
    }

    let body = response.text().await.map_err(|e| {
        MimegenError::Network(format!(
            "media type {}: {url}: failed to read body: {e}",
            record.internal_name
        ))
    })?;

    record.extensions.extend(extract_extensions(&body));
    Ok((record, true))
}
