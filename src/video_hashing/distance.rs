use serde::{Deserialize, Serialize};

use crate::definitions::{DEFAULT_DISTANCE_THRESHOLD, DEFAULT_MATCH_RATIO};
use crate::*;

/// Thresholds applied when deciding whether two assets are duplicates.
///
/// * `distance_threshold`: the maximum hamming distance (in bits) at which two fingerprints
///   count as a matching pair.
/// * `match_ratio`: the minimum fraction of matching pairs, relative to the size of the smaller
///   fingerprint set, for the two assets to be duplicates. Always within `0..=1`.
///
/// The thresholds are constant for a run and are passed explicitly to every comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatchCfg")]
pub struct MatchCfg {
    distance_threshold: u32,
    match_ratio: f64,
}

#[derive(Deserialize)]
struct RawMatchCfg {
    distance_threshold: u32,
    match_ratio: f64,
}

impl TryFrom<RawMatchCfg> for MatchCfg {
    type Error = CfgErrorKind;

    fn try_from(raw: RawMatchCfg) -> Result<Self, Self::Error> {
        Self::new(raw.distance_threshold, raw.match_ratio)
    }
}

impl MatchCfg {
    pub fn new(distance_threshold: u32, match_ratio: f64) -> Result<Self, CfgErrorKind> {
        if !(0.0..=1.0).contains(&match_ratio) {
            return Err(CfgErrorKind::MatchRatio(match_ratio));
        }

        Ok(Self {
            distance_threshold,
            match_ratio,
        })
    }

    pub fn distance_threshold(&self) -> u32 {
        self.distance_threshold
    }

    pub fn match_ratio(&self) -> f64 {
        self.match_ratio
    }
}

impl Default for MatchCfg {
    fn default() -> Self {
        Self {
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
            match_ratio: DEFAULT_MATCH_RATIO,
        }
    }
}

/// The number of matching pairs between two fingerprint sets, divided by the size of the smaller set.
///
/// Every fingerprint of `lhs` is compared with every fingerprint of `rhs`; a pair matches when its
/// hamming distance is at most `distance_threshold`. This is a full cross product, not a best-match
/// pairing, so an asset with many near-identical frames can score above 1.
///
/// Fails with [CompareErrorKind::EmptySet] if either set is empty, and with
/// [CompareErrorKind::LengthMismatch] if any compared pair differs in length.
pub fn match_ratio(
    lhs: &[Fingerprint],
    rhs: &[Fingerprint],
    distance_threshold: u32,
) -> Result<f64, CompareErrorKind> {
    let min_len = lhs.len().min(rhs.len());
    if min_len == 0 {
        return Err(CompareErrorKind::EmptySet);
    }

    let mut matches: u64 = 0;
    for l in lhs {
        for r in rhs {
            if l.hamming_distance(r)? <= distance_threshold {
                matches += 1;
            }
        }
    }

    Ok(matches as f64 / min_len as f64)
}

/// Decide whether two assets are duplicates of each other. See [match_ratio].
///
/// The decision is symmetric: swapping `lhs` and `rhs` never changes the result.
pub fn is_duplicate(lhs: &[Fingerprint], rhs: &[Fingerprint], cfg: &MatchCfg) -> Result<bool, CompareErrorKind> {
    let ratio = match_ratio(lhs, rhs, cfg.distance_threshold)?;
    Ok(ratio >= cfg.match_ratio)
}
