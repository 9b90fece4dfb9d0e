use agency_locator::workflows::addresses::{
    AddressMatcher, AddressParser, AddressRecord, ClusterDeduplicator, ComponentKind,
    ConsolidationStrategy, RuleBasedParser,
};

fn records(group: &str, addresses: &[&str]) -> Vec<AddressRecord> {
    addresses
        .iter()
        .map(|address| AddressRecord::new(group, *address))
        .collect()
}

fn distinct(records: &[AddressRecord]) -> Vec<&str> {
    let mut values: Vec<&str> = records.iter().map(|record| record.address.as_str()).collect();
    values.sort_unstable();
    values.dedup();
    values
}

#[test]
fn parser_labels_a_full_street_address() {
    let parsed = RuleBasedParser.parse("350 N Orleans St Suite 900, Chicago, IL 60654");

    assert_eq!(parsed.get(ComponentKind::AddressNumber), Some("350"));
    assert_eq!(parsed.get(ComponentKind::StreetNamePreDirectional), Some("N"));
    assert_eq!(parsed.get(ComponentKind::StreetName), Some("Orleans"));
    assert_eq!(parsed.get(ComponentKind::StreetNamePostType), Some("St"));
    assert_eq!(parsed.get(ComponentKind::OccupancyType), Some("Suite"));
    assert_eq!(parsed.get(ComponentKind::OccupancyIdentifier), Some("900"));
    assert_eq!(parsed.get(ComponentKind::PlaceName), Some("Chicago"));
    assert_eq!(parsed.get(ComponentKind::StateName), Some("IL"));
    assert_eq!(parsed.get(ComponentKind::ZipCode), Some("60654"));
}

#[test]
fn street_type_abbreviations_are_the_same_location() {
    let comparison = AddressMatcher::default().compare("123 Main St", "123 Main Street");

    assert!(comparison.is_match);
    assert!(comparison.needs_reconciliation());
    assert!(comparison
        .reconcile
        .contains(&ComponentKind::StreetNamePostType));
}

#[test]
fn house_numbers_must_agree() {
    let matcher = AddressMatcher::default();
    assert!(!matcher.compare("10 Oak Ave", "12 Oak Ave").is_match);
    assert!(!matcher.compare("10 Oak Ave Ste 4", "12 Oak Ave Ste 4").is_match);
}

#[test]
fn each_strategy_is_idempotent_on_its_own_output() {
    let input = records(
        "S1",
        &[
            "1 Main St",
            "1 Main Street",
            "1 Main Street, Chicago, IL 60601",
            "77 W Wacker Dr Ste 5",
            "77 W Wacker Dr",
        ],
    );

    for strategy in [ConsolidationStrategy::UnionFind, ConsolidationStrategy::Pairwise] {
        let deduplicator = ClusterDeduplicator::new(AddressMatcher::default(), strategy);
        let once = deduplicator.deduplicate(&input);
        let twice = deduplicator.deduplicate(&once);

        assert_eq!(once, twice, "{strategy} is not idempotent");
        assert_eq!(
            distinct(&once),
            vec!["1 Main Street, Chicago, IL 60601", "77 W Wacker Dr Ste 5"]
        );
    }
}

#[test]
fn canonical_forms_prefer_the_longest_spelling() {
    let input = records("S1", &["1 Main St", "1 Main Street, Chicago, IL 60601"]);
    let report = ClusterDeduplicator::default().consolidate(&input);

    assert_eq!(
        report.canonical_for("S1", "1 Main St"),
        Some("1 Main Street, Chicago, IL 60601")
    );
    assert_eq!(report.rewritten(), 1);
    assert_eq!(report.groups[0].matched.len(), 1);
}

#[test]
fn groups_never_merge_across_keys() {
    let mut input = records("S1", &["1 Main St"]);
    input.extend(records("S2", &["1 Main Street"]));

    let output = ClusterDeduplicator::default()
        .with_parallel_groups(true)
        .deduplicate(&input);
    assert_eq!(output, input);
}
