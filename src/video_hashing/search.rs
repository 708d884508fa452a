use std::collections::BTreeMap;

use rayon::prelude::*;

use super::disjoint_set::DisjointSet;
use crate::*;

#[derive(Debug)]
struct Entry<'a> {
    matched: bool,
    asset_id: &'a str,
    fingerprints: &'a [Fingerprint],
}

/// The working list of unresolved assets, in processing order.
#[derive(Debug)]
pub(super) struct Search<'a> {
    entries: Vec<Entry<'a>>,
}

impl<'a> Search<'a> {
    /// Seed the working list with every asset. Fails before any comparison if an asset has no
    /// fingerprints, so the outcome does not depend on where that asset sorts.
    pub fn new(assets: &'a BTreeMap<String, Vec<Fingerprint>>) -> Result<Self, ClusterErrorKind> {
        let entries = assets
            .iter()
            .map(|(asset_id, fingerprints)| {
                if fingerprints.is_empty() {
                    Err(ClusterErrorKind::EmptySet {
                        asset_id: asset_id.clone(),
                    })
                } else {
                    Ok(Entry {
                        matched: false,
                        asset_id,
                        fingerprints,
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { entries })
    }

    fn compare(lhs: &Entry, rhs: &Entry, cfg: &MatchCfg) -> Result<bool, ClusterErrorKind> {
        let is_dup = is_duplicate(lhs.fingerprints, rhs.fingerprints, cfg).map_err(|source| {
            ClusterErrorKind::Compare {
                root_id: lhs.asset_id.to_string(),
                candidate_id: rhs.asset_id.to_string(),
                source,
            }
        })?;

        trace!(
            target: "cluster",
            "{} vs {}: duplicate={}",
            lhs.asset_id,
            rhs.asset_id,
            is_dup
        );
        Ok(is_dup)
    }

    /// Walk the working list front to back. Each asset not yet claimed becomes a root, and claims
    /// every later unclaimed asset that is a duplicate of it. A claimed asset is never compared
    /// again, so it can neither become a root nor be claimed by a second root.
    pub fn search_greedy(&mut self, cfg: &MatchCfg) -> Result<Vec<DuplicateGroup>, ClusterErrorKind> {
        let mut ret = vec![];

        for lhs in 0..self.entries.len() {
            if self.entries[lhs].matched {
                continue;
            }

            let (head, tail) = self.entries.split_at_mut(lhs + 1);
            let root = &mut head[lhs];
            root.matched = true;

            let mut duplicates = vec![];
            for cand in tail.iter_mut().filter(|cand| !cand.matched) {
                if Self::compare(root, cand, cfg)? {
                    duplicates.push(cand.asset_id.to_string());
                    cand.matched = true;
                }
            }

            debug!(
                target: "cluster",
                "root {} claimed {} duplicate(s)",
                root.asset_id,
                duplicates.len()
            );
            ret.push(DuplicateGroup::new(root.asset_id, duplicates));
        }

        Ok(ret)
    }

    /// Group by the transitive closure of the pairwise duplicate relation. The root of each
    /// group is its first member in processing order, and the remaining members follow in
    /// processing order.
    pub fn search_transitive(&self, cfg: &MatchCfg) -> Result<Vec<DuplicateGroup>, ClusterErrorKind> {
        let pairs = (0..self.entries.len())
            .flat_map(|lhs| (lhs + 1..self.entries.len()).map(move |rhs| (lhs, rhs)))
            .collect::<Vec<_>>();

        //comparisons are pure, so they can run in parallel. Results are collected in pair order
        //so that the reported error (if any) is deterministic.
        let verdicts = pairs
            .par_iter()
            .map(|(lhs, rhs)| Self::compare(&self.entries[*lhs], &self.entries[*rhs], cfg))
            .collect::<Vec<_>>();

        let mut joined = DisjointSet::new();
        for ((lhs, rhs), verdict) in pairs.iter().zip(verdicts) {
            if verdict? {
                joined.insert(*lhs, *rhs);
            }
        }

        let mut ret = vec![];
        for (idx, entry) in self.entries.iter().enumerate() {
            match joined.set_of(&idx) {
                None => ret.push(DuplicateGroup::new(entry.asset_id, vec![])),

                //sets are ordered, so the first member is the root
                Some(members) if members.iter().next() == Some(&idx) => {
                    let duplicates = members
                        .iter()
                        .skip(1)
                        .map(|member| self.entries[*member].asset_id.to_string());
                    ret.push(DuplicateGroup::new(entry.asset_id, duplicates));
                }

                Some(_) => (),
            }
        }

        Ok(ret)
    }
}
