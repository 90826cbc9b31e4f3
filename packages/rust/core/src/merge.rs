//! Merging the override map with enriched registry records.
//!
//! Precedence is two-tiered: every override entry wins outright, and among
//! registry records the first one to claim an extension keeps it.

use std::collections::{HashMap, HashSet};

use mimegen_shared::{MergedMapping, OverrideMap, Record, RecordLabel};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Two registry records claiming the same extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub extension: String,
    /// The earlier record, whose media type was kept.
    pub kept: RecordLabel,
    /// The later record, whose claim was dropped.
    pub rejected: RecordLabel,
}

/// The final mapping plus every conflict found while building it.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub mapping: MergedMapping,
    pub conflicts: Vec<Conflict>,
}

/// Build the final mapping.
///
/// Override entries are copied first and never challenged. Registry
/// extensions are then applied in record order; a repeat within the same
/// record is ignored, a repeat across records is reported as one
/// [`Conflict`] per record pair. Records without a template are skipped.
#[instrument(skip_all, fields(overrides = overrides.len(), records = records.len()))]
pub fn merge(overrides: &OverrideMap, records: &[Record]) -> MergeOutcome {
    let mut mapping = overrides.clone();
    let mut conflicts = Vec::new();
    // extension → index of the record that claimed it
    let mut claims: HashMap<&str, usize> = HashMap::new();

    for (idx, record) in records.iter().enumerate() {
        if !record.has_template() {
            continue;
        }

        // A detail page may list the same extension on several lines.
        let mut seen: HashSet<&str> = HashSet::new();

        for ext in record.extensions.iter().filter(|e| !e.is_empty()) {
            if overrides.contains_key(ext) || !seen.insert(ext.as_str()) {
                continue;
            }

            match claims.get(ext.as_str()) {
                Some(&owner) => {
                    let conflict = Conflict {
                        extension: ext.clone(),
                        kept: records[owner].label(),
                        rejected: record.label(),
                    };
                    warn!(
                        extension = %conflict.extension,
                        kept = %conflict.kept,
                        rejected = %conflict.rejected,
                        "file extension conflict"
                    );
                    conflicts.push(conflict);
                }
                None => {
                    claims.insert(ext, idx);
                    mapping.insert(ext.clone(), record.media_type());
                }
            }
        }
    }

    info!(
        entries = mapping.len(),
        from_registry = claims.len(),
        conflicts = conflicts.len(),
        "merge complete"
    );

    MergeOutcome { mapping, conflicts }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, media_type: &str, exts: &[&str]) -> Record {
        let (type_, sub_type) = media_type.split_once('/').unwrap_or((media_type, ""));
        Record {
            internal_name: name.into(),
            type_: type_.into(),
            sub_type: sub_type.into(),
            detail_ref: None,
            extensions: exts.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn overrides(pairs: &[(&str, &str)]) -> OverrideMap {
        pairs
            .iter()
            .map(|(e, t)| (e.to_string(), t.to_string()))
            .collect()
    }

    #[test]
    fn override_wins_over_registry() {
        let overrides = overrides(&[("pdf", "application/pdf"), ("xps", "application/pdf")]);
        let records = vec![
            record("Some PDF variant", "application/x-pdf-variant", &["pdf"]),
            record("XPS", "application/vnd.ms-xpsdocument", &["xps"]),
        ];

        let outcome = merge(&overrides, &records);
        assert_eq!(outcome.mapping["pdf"], "application/pdf");
        assert_eq!(outcome.mapping["xps"], "application/pdf");
        assert!(outcome.conflicts.is_empty());
    }

    #[test]
    fn every_override_entry_survives() {
        let overrides = overrides(&[
            ("jpg", "image/jpeg"),
            ("png", "image/png"),
            ("txt", "text/plain"),
        ]);
        let records = vec![
            record("a", "image/x-a", &["jpg", "png"]),
            record("b", "text/x-b", &["txt", "png"]),
        ];

        let outcome = merge(&overrides, &records);
        for (ext, media_type) in &overrides {
            assert_eq!(&outcome.mapping[ext], media_type);
        }
        assert!(outcome.conflicts.is_empty());
    }

    #[test]
    fn single_claim_maps_to_record_type() {
        let records = vec![record("Portable Document Format", "application/pdf", &["pdf"])];
        let outcome = merge(&OverrideMap::new(), &records);
        assert_eq!(outcome.mapping.len(), 1);
        assert_eq!(outcome.mapping["pdf"], "application/pdf");
    }

    #[test]
    fn first_registry_claim_wins_and_conflict_logged_once() {
        let records = vec![
            record("first", "application/x-first", &["dat"]),
            record("second", "application/x-second", &["dat"]),
        ];

        let outcome = merge(&OverrideMap::new(), &records);
        assert_eq!(outcome.mapping["dat"], "application/x-first");
        assert_eq!(outcome.conflicts.len(), 1);

        let conflict = &outcome.conflicts[0];
        assert_eq!(conflict.extension, "dat");
        assert_eq!(conflict.kept.internal_name, "first");
        assert_eq!(conflict.rejected.internal_name, "second");
        assert_eq!(conflict.rejected.media_type, "application/x-second");
    }

    #[test]
    fn third_claimant_conflicts_with_first() {
        let records = vec![
            record("first", "application/x-first", &["dat"]),
            record("second", "application/x-second", &["dat"]),
            record("third", "application/x-third", &["dat"]),
        ];

        let outcome = merge(&OverrideMap::new(), &records);
        assert_eq!(outcome.mapping["dat"], "application/x-first");
        assert_eq!(outcome.conflicts.len(), 2);
        assert!(outcome.conflicts.iter().all(|c| c.kept.internal_name == "first"));
    }

    #[test]
    fn repeated_extension_in_later_record_conflicts_once() {
        let records = vec![
            record("first", "application/x-first", &["dat"]),
            record("second", "application/x-second", &["dat", "dat"]),
        ];

        let outcome = merge(&OverrideMap::new(), &records);
        assert_eq!(outcome.mapping["dat"], "application/x-first");
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.conflicts[0].rejected.internal_name, "second");
    }

    #[test]
    fn templateless_record_with_extensions_is_skipped() {
        let mut orphan = Record::new("orphan");
        orphan.extensions = vec!["orph".into()];

        let outcome = merge(&OverrideMap::new(), &[orphan]);
        assert!(outcome.mapping.is_empty());
    }

    #[test]
    fn repeat_within_one_record_is_not_a_conflict() {
        let records = vec![record("gzip", "application/gzip", &["gz", "gz"])];
        let outcome = merge(&OverrideMap::new(), &records);
        assert_eq!(outcome.mapping["gz"], "application/gzip");
        assert!(outcome.conflicts.is_empty());
    }

    #[test]
    fn empty_extensions_are_ignored() {
        let records = vec![record("odd", "application/x-odd", &["", "odd"])];
        let outcome = merge(&OverrideMap::new(), &records);
        assert_eq!(outcome.mapping.len(), 1);
        assert!(!outcome.mapping.contains_key(""));
    }

    #[test]
    fn record_without_template_contributes_nothing() {
        let records = vec![
            Record::new("vnd.example-deprecated"),
            record("json", "application/json", &["json"]),
        ];
        let outcome = merge(&OverrideMap::new(), &records);
        assert_eq!(outcome.mapping.len(), 1);
        assert_eq!(outcome.mapping["json"], "application/json");
    }
}
