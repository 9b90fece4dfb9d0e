use super::domain::{NeedsGeocoding, ResolvedLocation, SatelliteLocation};
use std::collections::HashSet;

/// Locations of vendors that operate at more than one site. The HQ's own row
/// is included when the vendor has satellites.
pub fn separate_satellites(locations: &[ResolvedLocation]) -> Vec<SatelliteLocation> {
    locations
        .iter()
        .filter(|location| location.num_locations > 1)
        .map(|location| SatelliteLocation {
            vendor_id: location.vendor_id.clone(),
            vendor_name: location.vendor_name.clone(),
            org_id: location.org_id.clone(),
            address: location.service_address.clone(),
            city: location.service_city.clone(),
            state: location.service_state.clone(),
            zip_code: location.service_zip_code.clone(),
            longitude: location.longitude,
            latitude: location.latitude,
            dollars_per_location: location.dollars_per_location,
        })
        .collect()
}

/// Satellites without coordinates, keyed by org id. Rows with no org id
/// cannot be joined back and are skipped.
pub fn needs_geocoding(satellites: &[SatelliteLocation]) -> Vec<NeedsGeocoding> {
    let mut seen = HashSet::new();
    satellites
        .iter()
        .filter(|satellite| satellite.latitude.is_none())
        .filter_map(|satellite| {
            Some(NeedsGeocoding {
                id: satellite.org_id.clone()?,
                address: satellite.address.clone(),
                city: satellite.city.clone(),
                state: satellite.state.clone(),
                zip: satellite.zip_code.clone(),
            })
        })
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
