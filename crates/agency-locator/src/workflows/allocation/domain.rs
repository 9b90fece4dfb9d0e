use serde::{Serialize, Serializer};

/// A headquarters vendor with the sum of all of its contract amounts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HqAgency {
    pub vendor_id: String,
    pub vendor_name: Option<String>,
    pub aggregate_amount: f64,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

/// A delivery address reported by a service agency, before deduplication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceLocation {
    pub org_id: Option<String>,
    pub service_agency_id: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

/// Service-side columns of a joined row. All empty for an HQ with no links.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceFields {
    pub org_id: Option<String>,
    pub service_agency_id: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

impl ServiceFields {
    pub(crate) fn from_location(location: &ServiceLocation) -> Self {
        Self {
            org_id: location.org_id.clone(),
            service_agency_id: Some(location.service_agency_id.clone()),
            address: location.address.clone(),
            city: location.city.clone(),
            state: location.state.clone(),
            zip_code: location.zip_code.clone(),
            longitude: location.longitude,
            latitude: location.latitude,
        }
    }
}

/// HQ x link x service location, as produced by the left joins.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub hq: HqAgency,
    pub cluster_id: Option<String>,
    pub service: ServiceFields,
}

impl JoinedRow {
    /// True when the service side names the HQ's own address, city, and
    /// state. Absent values never compare equal.
    pub fn is_hq_address(&self) -> bool {
        same_value(&self.hq.address, &self.service.address)
            && same_value(&self.hq.city, &self.service.city)
            && same_value(&self.hq.state, &self.service.state)
    }
}

fn same_value(left: &Option<String>, right: &Option<String>) -> bool {
    matches!((left, right), (Some(left), Some(right)) if left == right)
}

/// One HQ and one of its distinct resolved locations, with its share of the
/// HQ's dollars.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResolvedLocation {
    #[serde(rename = "VendorID")]
    pub vendor_id: String,
    pub vendor_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    #[serde(rename = "ClusterID")]
    pub cluster_id: Option<String>,
    #[serde(rename = "OrgID")]
    pub org_id: Option<String>,
    #[serde(rename = "ServiceAgencyID")]
    pub service_agency_id: Option<String>,
    pub service_address: Option<String>,
    pub service_city: Option<String>,
    pub service_state: Option<String>,
    pub service_zip_code: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub aggregate_amount: f64,
    pub num_locations: usize,
    pub dollars_per_location: f64,
    #[serde(rename = "IsHQFlag", serialize_with = "flag")]
    pub is_hq: bool,
}

/// A resolved location of a vendor that has more than one, with the
/// service-side columns under their plain names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SatelliteLocation {
    #[serde(rename = "VendorID")]
    pub vendor_id: String,
    pub vendor_name: Option<String>,
    #[serde(rename = "OrgID")]
    pub org_id: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub dollars_per_location: f64,
}

/// Work item for the external geocoder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NeedsGeocoding {
    #[serde(rename = "ID")]
    pub id: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

fn flag<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}
