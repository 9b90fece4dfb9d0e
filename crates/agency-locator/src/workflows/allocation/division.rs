use super::domain::{JoinedRow, ResolvedLocation};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Collapses backfilled rows to one per distinct location and splits each
/// HQ's aggregate amount evenly across its locations.
pub(crate) fn divide_dollars(rows: Vec<JoinedRow>) -> Vec<ResolvedLocation> {
    let mut rows = rows;
    rows.sort_by(location_order);

    let mut seen: HashSet<DistinctKey> = HashSet::new();
    let rows: Vec<JoinedRow> = rows
        .into_iter()
        .filter(|row| seen.insert(DistinctKey::of(row)))
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in &rows {
        *counts.entry(row.hq.vendor_id.as_str()).or_default() += 1;
    }

    rows.iter()
        .map(|row| {
            let num_locations = counts.get(row.hq.vendor_id.as_str()).copied().unwrap_or(1);
            ResolvedLocation {
                vendor_id: row.hq.vendor_id.clone(),
                vendor_name: row.hq.vendor_name.clone(),
                address: row.hq.address.clone(),
                city: row.hq.city.clone(),
                state: row.hq.state.clone(),
                zip_code: row.hq.zip_code.clone(),
                cluster_id: row.cluster_id.clone(),
                org_id: row.service.org_id.clone(),
                service_agency_id: row.service.service_agency_id.clone(),
                service_address: row.service.address.clone(),
                service_city: row.service.city.clone(),
                service_state: row.service.state.clone(),
                service_zip_code: row.service.zip_code.clone(),
                longitude: row.service.longitude,
                latitude: row.service.latitude,
                aggregate_amount: row.hq.aggregate_amount,
                num_locations,
                dollars_per_location: row.hq.aggregate_amount / num_locations as f64,
                is_hq: row.is_hq_address(),
            }
        })
        .collect()
}

/// Vendor, then service address, city, state, and zip; missing values last.
fn location_order(left: &JoinedRow, right: &JoinedRow) -> Ordering {
    left.hq
        .vendor_id
        .cmp(&right.hq.vendor_id)
        .then_with(|| missing_last(&left.service.address, &right.service.address))
        .then_with(|| missing_last(&left.service.city, &right.service.city))
        .then_with(|| missing_last(&left.service.state, &right.service.state))
        .then_with(|| missing_last(&left.service.zip_code, &right.service.zip_code))
}

fn missing_last(left: &Option<String>, right: &Option<String>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => left.cmp(right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Rows differing only in zip, org, or agency describe the same location.
#[derive(PartialEq, Eq, Hash)]
struct DistinctKey {
    vendor_id: String,
    hq: [Option<String>; 3],
    service: [Option<String>; 3],
}

impl DistinctKey {
    fn of(row: &JoinedRow) -> Self {
        Self {
            vendor_id: row.hq.vendor_id.clone(),
            hq: [
                row.hq.address.clone(),
                row.hq.city.clone(),
                row.hq.state.clone(),
            ],
            service: [
                row.service.address.clone(),
                row.service.city.clone(),
                row.service.state.clone(),
            ],
        }
    }
}
