//! Allocation of HQ contract dollars across the locations of linked service
//! agencies.
//!
//! Stages run in a fixed order over owned data: service address
//! deduplication, the HQ/link/service joins, marginal HQ insertion, backfill,
//! and the per-vendor division. Satellites and the geocoding queue are
//! projections of the resolved rows.

mod division;
mod domain;
mod extract;
mod join;
mod writer;

pub use domain::{
    HqAgency, JoinedRow, NeedsGeocoding, ResolvedLocation, SatelliteLocation, ServiceFields,
    ServiceLocation,
};
pub use extract::{needs_geocoding, separate_satellites};
pub use join::first_present;
pub use writer::{write_table, write_table_to_path, CsvTable, ExportError};

use crate::config::PipelineConfig;
use crate::workflows::addresses::{
    AddressMatcher, AddressParser, ClusterDeduplicator, DedupReport, RuleBasedParser,
};
use crate::workflows::ingest::InputTables;
use crate::workflows::linkage::LinkageResolver;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AllocationSummary {
    pub vendors: usize,
    pub resolved_rows: usize,
    pub satellites: usize,
    pub needs_geocoding: usize,
    pub consolidated_addresses: usize,
    pub total_amount_in: f64,
    pub total_amount_out: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AllocationOutcome {
    pub locations: Vec<ResolvedLocation>,
    pub satellites: Vec<SatelliteLocation>,
    pub needs_geocoding: Vec<NeedsGeocoding>,
    pub dedup: DedupReport,
    pub summary: AllocationSummary,
}

#[derive(Debug, Clone)]
pub struct AllocationPipeline<P = RuleBasedParser> {
    linkage: LinkageResolver,
    deduplicator: ClusterDeduplicator<P>,
}

impl AllocationPipeline<RuleBasedParser> {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::with_parser(config, RuleBasedParser)
    }
}

impl Default for AllocationPipeline<RuleBasedParser> {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl<P: AddressParser> AllocationPipeline<P> {
    pub fn with_parser(config: &PipelineConfig, parser: P) -> Self {
        Self {
            linkage: LinkageResolver::new(config.link_score_threshold),
            deduplicator: ClusterDeduplicator::new(AddressMatcher::new(parser), config.consolidation)
                .with_parallel_groups(config.parallel_groups),
        }
    }

    pub fn linkage(&self) -> &LinkageResolver {
        &self.linkage
    }

    pub fn deduplicator(&self) -> &ClusterDeduplicator<P> {
        &self.deduplicator
    }

    pub fn run(&self, tables: InputTables) -> AllocationOutcome {
        let InputTables {
            links,
            hq_agencies,
            services,
        } = tables;

        let pairs = self.linkage.resolve(&links);
        let (services, dedup) = join::deduplicate_services(services, &self.deduplicator);
        info!(
            pairs = pairs.len(),
            service_locations = services.len(),
            consolidated = dedup.rewritten(),
            strategy = %self.deduplicator.strategy(),
            "prepared links and service locations"
        );

        let joined = join::join_locations(&hq_agencies, &pairs, &services);
        let joined = join::insert_marginal_hq(joined);
        let joined = join::backfill(joined);
        let locations = division::divide_dollars(joined);

        let satellites = separate_satellites(&locations);
        let needs_geocoding = needs_geocoding(&satellites);

        let summary = AllocationSummary {
            vendors: hq_agencies.len(),
            resolved_rows: locations.len(),
            satellites: satellites.len(),
            needs_geocoding: needs_geocoding.len(),
            consolidated_addresses: dedup.rewritten(),
            total_amount_in: hq_agencies.iter().map(|hq| hq.aggregate_amount).sum(),
            total_amount_out: locations
                .iter()
                .map(|location| location.dollars_per_location)
                .sum(),
        };

        info!(
            vendors = summary.vendors,
            resolved_rows = summary.resolved_rows,
            satellites = summary.satellites,
            needs_geocoding = summary.needs_geocoding,
            total_amount_in = summary.total_amount_in,
            total_amount_out = summary.total_amount_out,
            "allocated HQ dollars across locations"
        );

        AllocationOutcome {
            locations,
            satellites,
            needs_geocoding,
            dedup,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::addresses::ConsolidationStrategy;

    #[test]
    fn pipeline_is_built_from_the_pipeline_config() {
        let config = PipelineConfig {
            link_score_threshold: 0.5,
            consolidation: ConsolidationStrategy::Pairwise,
            parallel_groups: true,
        };
        let pipeline = AllocationPipeline::from_config(&config);

        assert_eq!(pipeline.linkage().threshold(), 0.5);
        assert_eq!(
            pipeline.deduplicator().strategy(),
            ConsolidationStrategy::Pairwise
        );
    }

    #[test]
    fn empty_tables_allocate_nothing() {
        let outcome = AllocationPipeline::default().run(InputTables::default());
        assert_eq!(outcome, AllocationOutcome::default());
    }
}
