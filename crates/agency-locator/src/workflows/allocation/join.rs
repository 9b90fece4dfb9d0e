use super::domain::{HqAgency, JoinedRow, ServiceFields, ServiceLocation};
use crate::workflows::addresses::{AddressParser, AddressRecord, ClusterDeduplicator, DedupReport};
use crate::workflows::linkage::LinkedPair;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Canonicalizes each agency's address variants and drops rows that collapse
/// onto an address the agency already reported. Longer addresses are seen
/// first, so the surviving row is the one carrying the most complete text.
pub(crate) fn deduplicate_services<P: AddressParser>(
    services: Vec<ServiceLocation>,
    deduplicator: &ClusterDeduplicator<P>,
) -> (Vec<ServiceLocation>, DedupReport) {
    let mut services = services;
    services.sort_by_key(|location| {
        std::cmp::Reverse(location.address.as_ref().map_or(0, String::len))
    });

    let records: Vec<AddressRecord> = services
        .iter()
        .filter_map(|location| {
            let address = location.address.as_ref()?;
            Some(AddressRecord::new(
                location.service_agency_id.clone(),
                address.clone(),
            ))
        })
        .collect();
    let report = deduplicator.consolidate(&records);

    let mut seen: HashSet<(String, Option<String>)> = HashSet::new();
    let mut deduplicated = Vec::with_capacity(services.len());
    for mut location in services {
        if let Some(address) = location.address.as_deref() {
            if let Some(canonical) = report.canonical_for(&location.service_agency_id, address) {
                location.address = Some(canonical.to_string());
            }
        }

        let key = (location.service_agency_id.clone(), location.address.clone());
        if seen.insert(key) {
            deduplicated.push(location);
        }
    }

    (deduplicated, report)
}

/// HQ left-join links left-join service locations.
///
/// An HQ without links yields one row with empty service fields; a link
/// whose agency reported no locations yields one row carrying only the
/// agency id.
pub(crate) fn join_locations(
    hq_agencies: &[HqAgency],
    pairs: &[LinkedPair],
    services: &[ServiceLocation],
) -> Vec<JoinedRow> {
    let mut links_by_hq: BTreeMap<&str, Vec<&LinkedPair>> = BTreeMap::new();
    for pair in pairs {
        links_by_hq
            .entry(pair.hq_vendor_id.as_str())
            .or_default()
            .push(pair);
    }

    let mut locations_by_agency: HashMap<&str, Vec<&ServiceLocation>> = HashMap::new();
    for location in services {
        locations_by_agency
            .entry(location.service_agency_id.as_str())
            .or_default()
            .push(location);
    }

    let mut rows = Vec::new();
    for hq in hq_agencies {
        let Some(links) = links_by_hq.get(hq.vendor_id.as_str()) else {
            rows.push(JoinedRow {
                hq: hq.clone(),
                cluster_id: None,
                service: ServiceFields::default(),
            });
            continue;
        };

        for link in links {
            match locations_by_agency.get(link.service_agency_id.as_str()) {
                Some(locations) => {
                    rows.extend(locations.iter().map(|location| JoinedRow {
                        hq: hq.clone(),
                        cluster_id: Some(link.cluster_id.clone()),
                        service: ServiceFields::from_location(location),
                    }));
                }
                None => rows.push(JoinedRow {
                    hq: hq.clone(),
                    cluster_id: Some(link.cluster_id.clone()),
                    service: ServiceFields {
                        service_agency_id: Some(link.service_agency_id.clone()),
                        ..ServiceFields::default()
                    },
                }),
            }
        }
    }

    rows
}

/// Adds the HQ's own address as a location of every HQ that reports a
/// different service address, then keeps the first row per
/// (vendor, service address).
pub(crate) fn insert_marginal_hq(rows: Vec<JoinedRow>) -> Vec<JoinedRow> {
    let marginal: Vec<JoinedRow> = rows
        .iter()
        .filter(|row| row.service.address.is_some() && row.service.address != row.hq.address)
        .map(|row| {
            let mut hq_row = row.clone();
            hq_row.service.address = row.hq.address.clone();
            hq_row.service.city = row.hq.city.clone();
            hq_row.service.state = row.hq.state.clone();
            hq_row.service.zip_code = row.hq.zip_code.clone();
            hq_row.service.org_id = None;
            hq_row
        })
        .collect();

    let mut seen: HashSet<(String, Option<String>)> = HashSet::new();
    rows.into_iter()
        .chain(marginal)
        .filter(|row| seen.insert((row.hq.vendor_id.clone(), row.service.address.clone())))
        .collect()
}

/// Returns the first candidate that holds a value.
pub fn first_present<T: Clone>(candidates: &[&Option<T>]) -> Option<T> {
    candidates
        .iter()
        .find_map(|candidate| candidate.as_ref())
        .cloned()
}

/// Fills missing service address fields from the HQ and copies the HQ's
/// coordinates onto rows that are the HQ address itself.
///
/// Field priority: address, city, state, and zip take the service value,
/// then the HQ value. Coordinates are never borrowed across merely similar
/// addresses: they come from the HQ only when address, city, and state all
/// match, and are cleared otherwise so the row is queued for geocoding.
pub(crate) fn backfill(rows: Vec<JoinedRow>) -> Vec<JoinedRow> {
    rows.into_iter()
        .map(|mut row| {
            row.service.address = first_present(&[&row.service.address, &row.hq.address]);
            row.service.city = first_present(&[&row.service.city, &row.hq.city]);
            row.service.state = first_present(&[&row.service.state, &row.hq.state]);
            row.service.zip_code = first_present(&[&row.service.zip_code, &row.hq.zip_code]);

            if row.is_hq_address() {
                row.service.longitude = row.hq.longitude;
                row.service.latitude = row.hq.latitude;
            } else {
                row.service.longitude = None;
                row.service.latitude = None;
            }

            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hq(vendor_id: &str, address: &str) -> HqAgency {
        HqAgency {
            vendor_id: vendor_id.to_string(),
            vendor_name: Some(format!("{vendor_id} Services")),
            aggregate_amount: 100.0,
            address: Some(address.to_string()),
            city: Some("Chicago".to_string()),
            state: Some("IL".to_string()),
            zip_code: Some("60601".to_string()),
            longitude: Some(-87.62),
            latitude: Some(41.88),
        }
    }

    fn location(org: &str, agency: &str, address: Option<&str>) -> ServiceLocation {
        ServiceLocation {
            org_id: Some(org.to_string()),
            service_agency_id: agency.to_string(),
            address: address.map(str::to_string),
            city: Some("Chicago".to_string()),
            state: Some("IL".to_string()),
            zip_code: Some("60601".to_string()),
            longitude: None,
            latitude: None,
        }
    }

    fn pair(hq: &str, service: &str) -> LinkedPair {
        LinkedPair {
            cluster_id: "7".to_string(),
            hq_vendor_id: hq.to_string(),
            service_agency_id: service.to_string(),
        }
    }

    #[test]
    fn service_duplicates_collapse_to_the_longest_variant() {
        let services = vec![
            location("O1", "S1", Some("1 Main St")),
            location("O2", "S1", Some("1 Main Street")),
            location("O3", "S1", None),
            location("O4", "S2", Some("1 Main St")),
        ];
        let (deduplicated, report) =
            deduplicate_services(services, &ClusterDeduplicator::default());

        let s1: Vec<_> = deduplicated
            .iter()
            .filter(|location| location.service_agency_id == "S1")
            .collect();
        assert_eq!(s1.len(), 2);
        assert_eq!(s1[0].address.as_deref(), Some("1 Main Street"));
        assert_eq!(s1[0].org_id.as_deref(), Some("O2"));
        assert!(s1[1].address.is_none());
        assert_eq!(report.rewritten(), 1);
    }

    #[test]
    fn left_joins_keep_unlinked_hqs_and_empty_agencies() {
        let hqs = vec![hq("V1", "1 Main St"), hq("V2", "9 Oak Ave")];
        let pairs = vec![pair("V1", "S1"), pair("V1", "S9")];
        let services = vec![
            location("O1", "S1", Some("1 Main St")),
            location("O2", "S1", Some("2 Main St")),
        ];

        let rows = join_locations(&hqs, &pairs, &services);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2].service.service_agency_id.as_deref(), Some("S9"));
        assert!(rows[2].service.address.is_none());
        assert_eq!(rows[3].hq.vendor_id, "V2");
        assert_eq!(rows[3].service, ServiceFields::default());
    }

    #[test]
    fn marginal_hq_rows_are_added_once_per_vendor() {
        let hqs = vec![hq("V1", "1 Main St")];
        let pairs = vec![pair("V1", "S1")];
        let services = vec![
            location("O2", "S1", Some("2 Main St")),
            location("O3", "S1", Some("3 Main St")),
        ];

        let rows = insert_marginal_hq(join_locations(&hqs, &pairs, &services));
        let addresses: Vec<_> = rows
            .iter()
            .map(|row| row.service.address.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(addresses, vec!["2 Main St", "3 Main St", "1 Main St"]);
        assert!(rows[2].service.org_id.is_none());
    }

    #[test]
    fn backfill_prefers_service_values_and_only_copies_exact_hq_coordinates() {
        let hqs = vec![hq("V1", "1 Main St")];
        let mut unlinked = join_locations(&hqs, &[], &[]);
        let mut linked = join_locations(
            &hqs,
            &[pair("V1", "S1")],
            &[location("O2", "S1", Some("2 Main St"))],
        );
        linked[0].service.latitude = Some(1.0);
        unlinked.append(&mut linked);

        let rows = backfill(unlinked);
        assert_eq!(rows[0].service.address.as_deref(), Some("1 Main St"));
        assert_eq!(rows[0].service.latitude, Some(41.88));
        assert_eq!(rows[1].service.address.as_deref(), Some("2 Main St"));
        assert!(rows[1].service.latitude.is_none());
    }

    #[test]
    fn first_present_walks_candidates_in_order() {
        let missing: Option<&str> = None;
        assert_eq!(first_present(&[&missing, &Some("hq"), &Some("x")]), Some("hq"));
        assert_eq!(first_present::<&str>(&[&None, &None]), None);
    }
}
