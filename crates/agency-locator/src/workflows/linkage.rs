//! Turns scored cluster memberships into HQ -> service agency links.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One row of the entity-resolution output: a vendor placed in a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkCandidate {
    pub cluster_id: String,
    pub vendor_id: String,
    pub vendor_name: Option<String>,
    pub link_score: f64,
}

/// Two distinct vendors that share a cluster.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkedPair {
    pub cluster_id: String,
    pub hq_vendor_id: String,
    pub service_agency_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkageResolver {
    threshold: f64,
}

impl LinkageResolver {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn accepts(&self, candidate: &LinkCandidate) -> bool {
        candidate.link_score >= self.threshold
    }

    /// Self-joins the retained candidates on cluster id and drops pairs that
    /// point a vendor at itself. Links do not chain across clusters.
    ///
    /// Output is sorted by (HQ, service agency); when a pair is implied by
    /// more than one cluster, the first cluster in input order is kept.
    pub fn resolve(&self, candidates: &[LinkCandidate]) -> Vec<LinkedPair> {
        let mut clusters: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        let mut cluster_order: Vec<&str> = Vec::new();
        let mut retained = 0usize;

        for candidate in candidates.iter().filter(|candidate| self.accepts(candidate)) {
            retained += 1;
            let members = clusters
                .entry(candidate.cluster_id.as_str())
                .or_insert_with(|| {
                    cluster_order.push(candidate.cluster_id.as_str());
                    Vec::new()
                });
            if !members.contains(&candidate.vendor_id.as_str()) {
                members.push(candidate.vendor_id.as_str());
            }
        }

        let mut pairs: BTreeMap<(&str, &str), &str> = BTreeMap::new();
        for cluster_id in cluster_order {
            let members = &clusters[cluster_id];
            for hq in members {
                for service in members.iter().filter(|service| *service != hq) {
                    pairs.entry((*hq, *service)).or_insert(cluster_id);
                }
            }
        }

        debug!(
            candidates = candidates.len(),
            retained,
            threshold = self.threshold,
            pairs = pairs.len(),
            "resolved cluster links"
        );

        pairs
            .into_iter()
            .map(|((hq, service), cluster_id)| LinkedPair {
                cluster_id: cluster_id.to_string(),
                hq_vendor_id: hq.to_string(),
                service_agency_id: service.to_string(),
            })
            .collect()
    }
}
