use crate::infra::{parse_consolidation, parse_threshold};
use agency_locator::config::AppConfig;
use agency_locator::error::AppError;
use agency_locator::telemetry;
use agency_locator::workflows::addresses::{
    AddressMatcher, AddressParser, AddressRecord, ClusterDeduplicator, ConsolidationStrategy,
    DedupReport,
};
use agency_locator::workflows::allocation::{
    write_table_to_path, AllocationOutcome, AllocationPipeline,
};
use agency_locator::workflows::ingest::{read_service_locations, InputTables};
use clap::Args;
use std::fs::File;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct AllocateArgs {
    /// Entity-resolution link table (ClusterID, VendorID, LinkScore)
    #[arg(long)]
    pub(crate) links: PathBuf,
    /// HQ contract table, one row per contract
    #[arg(long)]
    pub(crate) hq: PathBuf,
    /// Service agency location table
    #[arg(long)]
    pub(crate) services: PathBuf,
    /// Where to write the allocation table
    #[arg(long)]
    pub(crate) out: PathBuf,
    /// Also write the satellite locations table
    #[arg(long)]
    pub(crate) satellites: Option<PathBuf>,
    /// Also write the rows that still need geocoding
    #[arg(long)]
    pub(crate) geocode_out: Option<PathBuf>,
    /// Minimum link score (overrides LINK_SCORE_THRESHOLD)
    #[arg(long, value_parser = parse_threshold)]
    pub(crate) threshold: Option<f64>,
    /// union-find or pairwise (overrides ADDRESS_CONSOLIDATION)
    #[arg(long, value_parser = parse_consolidation)]
    pub(crate) consolidation: Option<ConsolidationStrategy>,
}

#[derive(Args, Debug)]
pub(crate) struct CompareArgs {
    /// First address; its components drive the comparison
    pub(crate) a: String,
    /// Second address
    pub(crate) b: String,
}

#[derive(Args, Debug)]
pub(crate) struct DedupArgs {
    /// Service agency location table
    #[arg(long)]
    pub(crate) services: PathBuf,
    /// union-find or pairwise (overrides ADDRESS_CONSOLIDATION)
    #[arg(long, value_parser = parse_consolidation)]
    pub(crate) consolidation: Option<ConsolidationStrategy>,
}

pub(crate) fn run_allocate(args: AllocateArgs) -> Result<(), AppError> {
    let AllocateArgs {
        links,
        hq,
        services,
        out,
        satellites,
        geocode_out,
        threshold,
        consolidation,
    } = args;

    let mut pipeline = load_config_with_telemetry()?.pipeline;
    if let Some(threshold) = threshold {
        pipeline.link_score_threshold = threshold;
    }
    if let Some(consolidation) = consolidation {
        pipeline.consolidation = consolidation;
    }

    let tables = InputTables::from_paths(&links, &hq, &services)?;
    let pipeline = AllocationPipeline::from_config(&pipeline);
    let outcome = pipeline.run(tables);

    write_table_to_path(&out, &outcome.locations)?;
    if let Some(path) = &satellites {
        write_table_to_path(path, &outcome.satellites)?;
    }
    if let Some(path) = &geocode_out {
        write_table_to_path(path, &outcome.needs_geocoding)?;
    }

    render_allocation_summary(&outcome, &pipeline);
    println!("\nWrote {}", out.display());
    for path in satellites.iter().chain(geocode_out.iter()) {
        println!("Wrote {}", path.display());
    }

    Ok(())
}

pub(crate) fn run_compare(args: CompareArgs) -> Result<(), AppError> {
    load_config_with_telemetry()?;

    let matcher = AddressMatcher::default();
    let comparison = matcher.compare(&args.a, &args.b);

    for (label, text) in [("A", &args.a), ("B", &args.b)] {
        println!("{label}: {text}");
        for (kind, value) in matcher.parser().parse(text).iter() {
            println!("  {kind}: {value}");
        }
    }

    println!(
        "\nDecision: {}",
        if comparison.is_match {
            "same location"
        } else {
            "different locations"
        }
    );
    if comparison.needs_reconciliation() {
        let fields: Vec<&str> = comparison.reconcile.iter().map(|kind| kind.label()).collect();
        println!("Fields to reconcile: {}", fields.join(", "));
    }

    Ok(())
}

pub(crate) fn run_dedup(args: DedupArgs) -> Result<(), AppError> {
    let mut pipeline = load_config_with_telemetry()?.pipeline;
    if let Some(consolidation) = args.consolidation {
        pipeline.consolidation = consolidation;
    }

    let file = File::open(&args.services)?;
    let locations = read_service_locations(file)?;
    let records: Vec<AddressRecord> = locations
        .iter()
        .filter_map(|location| {
            let address = location.address.as_ref()?;
            Some(AddressRecord::new(
                location.service_agency_id.clone(),
                address.clone(),
            ))
        })
        .collect();

    let deduplicator = ClusterDeduplicator::new(AddressMatcher::default(), pipeline.consolidation)
        .with_parallel_groups(pipeline.parallel_groups);
    let report = deduplicator.consolidate(&records);
    render_dedup_report(&report, deduplicator.strategy());

    Ok(())
}

/// Command-line runs log to stderr so the printed report stays clean.
fn load_config_with_telemetry() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

fn render_allocation_summary(outcome: &AllocationOutcome, pipeline: &AllocationPipeline) {
    let summary = &outcome.summary;

    println!("Allocation summary");
    println!(
        "Link threshold {} | consolidation {}",
        pipeline.linkage().threshold(),
        pipeline.deduplicator().strategy()
    );
    println!("- {} HQ vendors", summary.vendors);
    println!(
        "- {} resolved locations ({} at vendors with satellites)",
        summary.resolved_rows, summary.satellites
    );
    println!(
        "- {} service addresses consolidated into canonical spellings",
        summary.consolidated_addresses
    );
    println!("- {} locations still need geocoding", summary.needs_geocoding);
    println!(
        "- ${:.2} allocated of ${:.2} contracted",
        summary.total_amount_out, summary.total_amount_in
    );
}

fn render_dedup_report(report: &DedupReport, strategy: ConsolidationStrategy) {
    println!("Address consolidation ({strategy})");

    let mut rewritten = 0;
    let mut agencies = 0;
    for group in &report.groups {
        let changes: Vec<(&String, &String)> = group
            .canonical
            .iter()
            .filter(|(original, canonical)| original != canonical)
            .collect();
        if changes.is_empty() {
            continue;
        }

        agencies += 1;
        println!("\n{}", group.group_key);
        for (original, canonical) in changes {
            println!("  {original} -> {canonical}");
            rewritten += 1;
        }
    }

    if rewritten == 0 {
        println!("No address variants to consolidate.");
    } else {
        println!(
            "\n{rewritten} addresses rewritten across {agencies} of {} agencies",
            report.groups.len()
        );
    }
}
