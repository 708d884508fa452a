use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for the reasons why a [Fingerprint][crate::Fingerprint] could not be created from a frame.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FingerprintErrorKind {
    /// The frame could not be read, was not an image, or could not be resampled.
    /// src_path is empty when the image was supplied already decoded.
    #[error("Failed to decode frame {src_path:?}: {reason}")]
    Decode { src_path: PathBuf, reason: String },
}

/// Error type for fingerprint comparisons.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareErrorKind {
    /// Two fingerprints of unequal bit length were compared. This happens when fingerprints
    /// created with different configurations are mixed in one run.
    #[error("Fingerprint length mismatch: {lhs} bits vs {rhs} bits")]
    LengthMismatch { lhs: u32, rhs: u32 },

    /// One of the compared fingerprint sets was empty, so no match ratio exists.
    #[error("Cannot compare an empty fingerprint set")]
    EmptySet,
}

/// Error type for the duplicate cluster resolver.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterErrorKind {
    /// An asset without any fingerprints was supplied.
    #[error("Asset has no fingerprints: {asset_id}")]
    EmptySet { asset_id: String },

    /// Comparing two assets failed.
    #[error("Failed to compare {root_id} with {candidate_id}: {source}")]
    Compare {
        root_id: String,
        candidate_id: String,
        source: CompareErrorKind,
    },
}

/// Error type for invalid comparison or pipeline configuration.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CfgErrorKind {
    #[error("Match ratio must be within 0..=1, got {0}")]
    MatchRatio(f64),

    #[error("At least one fingerprint task must be allowed in flight")]
    MaxInFlight,
}

/// Error type for parsing the textual `'0'/'1'` form of a fingerprint.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseFingerprintErrorKind {
    #[error("Invalid character {ch:?} at position {idx}")]
    InvalidChar { idx: usize, ch: char },

    #[error("Fingerprint string is empty")]
    Empty,
}

/// Error type for the batch pipeline. Per-asset failures are not errors at this level: they are
/// reported as [SkippedAsset][crate::SkippedAsset]s.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PipelineErrorKind {
    #[error("Failed to read {path:?}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Failed to start fingerprinting workers: {0}")]
    WorkerPool(String),

    #[error(transparent)]
    Cfg(#[from] CfgErrorKind),

    #[error(transparent)]
    Cluster(#[from] ClusterErrorKind),
}
