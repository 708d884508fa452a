use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::search::Search;
use crate::*;

/// How assets are grouped once their fingerprint sets are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClusterPolicy {
    /// Greedy, order-dependent absorption (see [cluster]). This is the default.
    #[default]
    Greedy,

    /// Group by the transitive closure of the pairwise [is_duplicate] relation. This compares
    /// every pair of assets and can merge groups that [ClusterPolicy::Greedy] keeps apart, so
    /// it changes output groupings.
    Transitive,
}

/// Group assets into duplicate clusters.
///
/// Assets are processed in lexicographic order of their IDs. Each asset that has not already been
/// claimed becomes a cluster root, and claims every later unclaimed asset that
/// [is_duplicate] reports as its duplicate. A claimed asset is removed from further
/// consideration, so every asset ends up either as a root (possibly with no duplicates) or in
/// exactly one root's duplicate list, never both.
///
/// Similarity is not transitive, so when A~B and B~C but not A~C, group membership depends on
/// processing order. This is an accepted approximation; use [cluster_with_policy] with
/// [ClusterPolicy::Transitive] when transitive grouping is required.
///
/// Fails with [ClusterErrorKind::EmptySet] if any asset has no fingerprints, or
/// [ClusterErrorKind::Compare] if a comparison fails. No assets yields empty groups.
pub fn cluster(
    assets: &BTreeMap<String, Vec<Fingerprint>>,
    cfg: &MatchCfg,
) -> Result<DuplicateGroups, ClusterErrorKind> {
    cluster_with_policy(assets, cfg, ClusterPolicy::Greedy)
}

/// Group assets into duplicate clusters using the given policy. See [cluster].
pub fn cluster_with_policy(
    assets: &BTreeMap<String, Vec<Fingerprint>>,
    cfg: &MatchCfg,
    policy: ClusterPolicy,
) -> Result<DuplicateGroups, ClusterErrorKind> {
    let mut search = Search::new(assets)?;

    let groups = match policy {
        ClusterPolicy::Greedy => search.search_greedy(cfg)?,
        ClusterPolicy::Transitive => search.search_transitive(cfg)?,
    };

    Ok(DuplicateGroups::new(groups))
}
