//! Build orchestration for mimegen.
//!
//! This crate ties the override source and the registry scraper together
//! into one conflict-resolved mapping ([`merge`]), serializes it
//! ([`emit`]), and runs the whole thing end to end ([`pipeline`]).

pub mod emit;
pub mod merge;
pub mod pipeline;

pub use emit::{ArtifactMeta, BuildManifest, MANIFEST_FILE_NAME};
pub use merge::{Conflict, MergeOutcome};
pub use pipeline::{BuildResult, ProgressReporter, SilentProgress, build};
