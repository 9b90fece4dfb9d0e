use super::matcher::{compare_structured, AddressMatcher};
use super::parser::{AddressParser, RuleBasedParser, StructuredAddress};
use petgraph::unionfind::UnionFind;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// How matched address variants inside a group collapse to one string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsolidationStrategy {
    /// Disjoint-set over matched pairs; every class maps to its longest
    /// member (lexicographically smallest on ties). Transitive.
    UnionFind,
    /// In-order directed rewrite of the later string to the earlier one,
    /// compared on current values. Not transitive.
    Pairwise,
}

impl ConsolidationStrategy {
    pub const fn label(self) -> &'static str {
        match self {
            Self::UnionFind => "union-find",
            Self::Pairwise => "pairwise",
        }
    }
}

impl fmt::Display for ConsolidationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStrategy(pub String);

impl fmt::Display for UnknownStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown consolidation strategy '{}' (expected 'union-find' or 'pairwise')",
            self.0
        )
    }
}

impl std::error::Error for UnknownStrategy {}

impl FromStr for ConsolidationStrategy {
    type Err = UnknownStrategy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "union-find" | "union_find" | "unionfind" => Ok(Self::UnionFind),
            "pairwise" => Ok(Self::Pairwise),
            _ => Err(UnknownStrategy(value.to_string())),
        }
    }
}

/// An address string reported under a grouping key (vendor, cluster, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AddressRecord {
    pub group_key: String,
    pub address: String,
}

impl AddressRecord {
    pub fn new(group_key: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            group_key: group_key.into(),
            address: address.into(),
        }
    }
}

/// Canonical forms chosen for one group, plus the pairwise decisions that
/// produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupConsolidation {
    pub group_key: String,
    /// Every distinct input address mapped to its canonical address.
    pub canonical: BTreeMap<String, String>,
    pub matched: Vec<(String, String)>,
    pub unmatched: Vec<(String, String)>,
}

impl GroupConsolidation {
    pub fn rewritten(&self) -> usize {
        self.canonical
            .iter()
            .filter(|(original, canonical)| original != canonical)
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    pub groups: Vec<GroupConsolidation>,
}

impl DedupReport {
    pub fn canonical_for(&self, group_key: &str, address: &str) -> Option<&str> {
        self.groups
            .binary_search_by(|group| group.group_key.as_str().cmp(group_key))
            .ok()
            .and_then(|index| self.groups[index].canonical.get(address))
            .map(String::as_str)
    }

    /// Replaces each record's address with its canonical form.
    pub fn apply(&self, records: &[AddressRecord]) -> Vec<AddressRecord> {
        records
            .iter()
            .map(|record| {
                let address = self
                    .canonical_for(&record.group_key, &record.address)
                    .unwrap_or(&record.address);
                AddressRecord::new(record.group_key.clone(), address)
            })
            .collect()
    }

    pub fn rewritten(&self) -> usize {
        self.groups.iter().map(GroupConsolidation::rewritten).sum()
    }
}

/// Collapses near-duplicate address strings within each group key.
#[derive(Debug, Clone)]
pub struct ClusterDeduplicator<P = RuleBasedParser> {
    matcher: AddressMatcher<P>,
    strategy: ConsolidationStrategy,
    parallel: bool,
}

impl Default for ClusterDeduplicator<RuleBasedParser> {
    fn default() -> Self {
        Self::new(AddressMatcher::default(), ConsolidationStrategy::UnionFind)
    }
}

impl<P: AddressParser> ClusterDeduplicator<P> {
    pub fn new(matcher: AddressMatcher<P>, strategy: ConsolidationStrategy) -> Self {
        Self {
            matcher,
            strategy,
            parallel: false,
        }
    }

    /// Groups share no state, so they can be spread over the rayon pool.
    pub fn with_parallel_groups(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn strategy(&self) -> ConsolidationStrategy {
        self.strategy
    }

    pub fn matcher(&self) -> &AddressMatcher<P> {
        &self.matcher
    }

    /// Computes the original -> canonical mapping for every group. Groups in
    /// the report are sorted by key.
    pub fn consolidate(&self, records: &[AddressRecord]) -> DedupReport {
        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for record in records {
            grouped
                .entry(record.group_key.as_str())
                .or_default()
                .push(record.address.as_str());
        }

        let groups: Vec<(&str, Vec<&str>)> = grouped.into_iter().collect();
        let groups: Vec<GroupConsolidation> = if self.parallel {
            groups
                .into_par_iter()
                .map(|(key, addresses)| self.consolidate_group(key, addresses))
                .collect()
        } else {
            groups
                .into_iter()
                .map(|(key, addresses)| self.consolidate_group(key, addresses))
                .collect()
        };

        DedupReport { groups }
    }

    /// Runs `consolidate` and applies the mapping in one pass.
    pub fn deduplicate(&self, records: &[AddressRecord]) -> Vec<AddressRecord> {
        self.consolidate(records).apply(records)
    }

    fn consolidate_group(&self, group_key: &str, addresses: Vec<&str>) -> GroupConsolidation {
        let mut ordered: Vec<&str> = addresses;
        ordered.sort_by(|left, right| longest_first(left, right));
        ordered.dedup();

        let mut consolidation = match self.strategy {
            ConsolidationStrategy::UnionFind => self.union_find(&ordered),
            ConsolidationStrategy::Pairwise => self.pairwise(&ordered),
        };
        consolidation.group_key = group_key.to_string();

        if !consolidation.matched.is_empty() {
            debug!(
                group = group_key,
                addresses = ordered.len(),
                matched = consolidation.matched.len(),
                rewritten = consolidation.rewritten(),
                "consolidated address variants"
            );
        }

        consolidation
    }

    fn parse_all(&self, ordered: &[&str]) -> Vec<StructuredAddress> {
        let parser = self.matcher().parser();
        ordered.iter().map(|address| parser.parse(address)).collect()
    }

    fn union_find(&self, ordered: &[&str]) -> GroupConsolidation {
        let parsed = self.parse_all(ordered);
        let mut sets = UnionFind::<usize>::new(ordered.len());
        let mut consolidation = GroupConsolidation::default();

        for left in 0..ordered.len() {
            for right in left + 1..ordered.len() {
                let comparison = compare_structured(
                    ordered[left],
                    &parsed[left],
                    ordered[right],
                    &parsed[right],
                );
                let pair = (ordered[left].to_string(), ordered[right].to_string());
                if comparison.is_match {
                    if !comparison.reconcile.is_empty() {
                        sets.union(left, right);
                    }
                    consolidation.matched.push(pair);
                } else {
                    consolidation.unmatched.push(pair);
                }
            }
        }

        // Roots are rank-based. Indices follow `longest_first`, so the first
        // index seen for a root is the class's best member.
        let labels = sets.into_labeling();
        let mut best: Vec<Option<usize>> = vec![None; ordered.len()];
        for (index, address) in ordered.iter().enumerate() {
            let representative = *best[labels[index]].get_or_insert(index);
            consolidation
                .canonical
                .insert(address.to_string(), ordered[representative].to_string());
        }

        consolidation
    }

    fn pairwise(&self, ordered: &[&str]) -> GroupConsolidation {
        let parsed = self.parse_all(ordered);
        // Each slot holds the index of its current value; rewrites only ever
        // copy another original string, so the parses stay valid.
        let mut current: Vec<usize> = (0..ordered.len()).collect();
        let mut consolidation = GroupConsolidation::default();

        for left in 0..current.len() {
            for right in left + 1..current.len() {
                let (left_value, right_value) = (current[left], current[right]);
                let comparison = compare_structured(
                    ordered[left_value],
                    &parsed[left_value],
                    ordered[right_value],
                    &parsed[right_value],
                );
                let pair = (
                    ordered[left_value].to_string(),
                    ordered[right_value].to_string(),
                );
                if comparison.is_match {
                    if !comparison.reconcile.is_empty() {
                        current[right] = left_value;
                    }
                    consolidation.matched.push(pair);
                } else {
                    consolidation.unmatched.push(pair);
                }
            }
        }

        for (original, value) in ordered.iter().zip(current) {
            consolidation
                .canonical
                .insert(original.to_string(), ordered[value].to_string());
        }

        consolidation
    }
}

/// Longer strings first; ties in byte order so the result is deterministic.
fn longest_first(left: &str, right: &str) -> Ordering {
    right.len().cmp(&left.len()).then_with(|| left.cmp(right))
}
