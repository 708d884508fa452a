mod asset_frames;
mod frame_pool;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::definitions::{DEFAULT_FRAME_EXT, DEFAULT_MAX_IN_FLIGHT};
use crate::*;

pub use asset_frames::{discover_assets, AssetFrames};
pub use frame_pool::{fingerprint_assets, Progress};

/// Configuration for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPipelineCfg")]
pub struct PipelineCfg {
    match_cfg: MatchCfg,
    policy: ClusterPolicy,
    max_in_flight: usize,
    frame_exts: Vec<String>,
}

impl PipelineCfg {
    pub fn new(match_cfg: MatchCfg) -> Self {
        Self {
            match_cfg,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: ClusterPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Bound the number of frames fingerprinted concurrently. Must be at least 1.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Result<Self, CfgErrorKind> {
        if max_in_flight == 0 {
            return Err(CfgErrorKind::MaxInFlight);
        }
        self.max_in_flight = max_in_flight;
        Ok(self)
    }

    /// File extensions (without the dot) that are treated as frames.
    pub fn with_frame_exts(mut self, frame_exts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.frame_exts = frame_exts.into_iter().map(Into::into).collect();
        self
    }

    pub fn match_cfg(&self) -> &MatchCfg {
        &self.match_cfg
    }

    pub fn policy(&self) -> ClusterPolicy {
        self.policy
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    pub fn frame_exts(&self) -> &[String] {
        &self.frame_exts
    }
}

//deserialized values go through the same checks as the builder
#[derive(Deserialize)]
struct RawPipelineCfg {
    match_cfg: MatchCfg,
    policy: ClusterPolicy,
    max_in_flight: usize,
    frame_exts: Vec<String>,
}

impl TryFrom<RawPipelineCfg> for PipelineCfg {
    type Error = CfgErrorKind;

    fn try_from(raw: RawPipelineCfg) -> Result<Self, Self::Error> {
        Ok(PipelineCfg::new(raw.match_cfg)
            .with_policy(raw.policy)
            .with_max_in_flight(raw.max_in_flight)?
            .with_frame_exts(raw.frame_exts))
    }
}

impl Default for PipelineCfg {
    fn default() -> Self {
        Self {
            match_cfg: MatchCfg::default(),
            policy: ClusterPolicy::default(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            frame_exts: vec![DEFAULT_FRAME_EXT.to_string()],
        }
    }
}

/// Why an asset was left out of clustering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// One of the asset's frames could not be fingerprinted.
    Decode(FingerprintErrorKind),

    /// The asset's directory held no frames.
    EmptySet,

    /// The asset's directory name is not valid UTF-8, so it has no usable ID. The reported ID is
    /// a lossy rendering of the name.
    InvalidId,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "{}", e),
            Self::EmptySet => write!(f, "no frames"),
            Self::InvalidId => write!(f, "directory name is not valid UTF-8"),
        }
    }
}

/// An asset that was not clustered. A skipped asset is not known to be free of duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedAsset {
    asset_id: String,
    reason: SkipReason,
}

impl SkippedAsset {
    pub fn new(asset_id: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            asset_id: asset_id.into(),
            reason,
        }
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    pub fn reason(&self) -> &SkipReason {
        &self.reason
    }
}

/// The outcome of a pipeline run: the duplicate groups of every asset that could be
/// fingerprinted, and the assets that could not.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DedupReport {
    groups: DuplicateGroups,
    skipped: Vec<SkippedAsset>,
}

impl DedupReport {
    pub fn groups(&self) -> &DuplicateGroups {
        &self.groups
    }

    pub fn skipped(&self) -> &[SkippedAsset] {
        &self.skipped
    }

    pub fn into_parts(self) -> (DuplicateGroups, Vec<SkippedAsset>) {
        (self.groups, self.skipped)
    }
}

/// Find duplicate assets under keyframes_dir, which holds one sub-directory of frames per asset.
/// See [find_duplicates_with_progress].
pub fn find_duplicates(keyframes_dir: impl AsRef<Path>, cfg: &PipelineCfg) -> Result<DedupReport, PipelineErrorKind> {
    find_duplicates_with_progress(keyframes_dir, cfg, |_| ())
}

/// Find duplicate assets under keyframes_dir, reporting fingerprinting progress as it goes.
///
/// Every frame is fingerprinted first (see [fingerprint_assets]); clustering only starts once all
/// fingerprint sets are complete. Assets that could not be fingerprinted are listed in
/// [DedupReport::skipped] (sorted by ID) and never appear in the groups.
pub fn find_duplicates_with_progress<F>(
    keyframes_dir: impl AsRef<Path>,
    cfg: &PipelineCfg,
    on_progress: F,
) -> Result<DedupReport, PipelineErrorKind>
where
    F: FnMut(Progress),
{
    let (assets, mut skipped) = discover_assets(keyframes_dir, cfg)?;
    info!(target: "pipeline", "Processing {} asset directories...", assets.len());

    let (fingerprints, fingerprint_skips) = fingerprint_assets(&assets, cfg, on_progress)?;
    skipped.extend(fingerprint_skips);
    skipped.sort_by(|a, b| a.asset_id().cmp(b.asset_id()));

    let groups = cluster_with_policy(&fingerprints, &cfg.match_cfg, cfg.policy)?;

    info!(
        target: "pipeline",
        "{} asset(s) clustered into {} group(s), {} skipped",
        fingerprints.len(),
        groups.len(),
        skipped.len()
    );

    Ok(DedupReport { groups, skipped })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cfg_round_trips_through_json() {
        let cfg = PipelineCfg::new(MatchCfg::new(7, 0.25).unwrap())
            .with_policy(ClusterPolicy::Transitive)
            .with_max_in_flight(3)
            .unwrap()
            .with_frame_exts(["png"]);

        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(serde_json::from_str::<PipelineCfg>(&json).unwrap(), cfg);
    }

    #[test]
    fn test_deserialized_cfg_is_validated() {
        let zero_in_flight = r#"{
            "match_cfg": {"distance_threshold": 5, "match_ratio": 0.5},
            "policy": "Greedy",
            "max_in_flight": 0,
            "frame_exts": ["jpg"]
        }"#;
        assert!(serde_json::from_str::<PipelineCfg>(zero_in_flight).is_err());

        let bad_ratio = r#"{
            "match_cfg": {"distance_threshold": 5, "match_ratio": 7.0},
            "policy": "Greedy",
            "max_in_flight": 4,
            "frame_exts": ["jpg"]
        }"#;
        assert!(serde_json::from_str::<PipelineCfg>(bad_ratio).is_err());
    }
}
