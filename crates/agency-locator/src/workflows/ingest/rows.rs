use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
pub(crate) struct LinkRow {
    #[serde(rename = "ClusterID")]
    pub(crate) cluster_id: String,
    #[serde(rename = "VendorID", alias = "CSDS_Vendor_ID")]
    pub(crate) vendor_id: String,
    #[serde(
        rename = "VendorName",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) vendor_name: Option<String>,
    #[serde(rename = "LinkScore")]
    pub(crate) link_score: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContractRow {
    #[serde(rename = "VendorID", alias = "CSDS_Vendor_ID")]
    pub(crate) vendor_id: String,
    #[serde(
        rename = "VendorName",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) vendor_name: Option<String>,
    #[serde(rename = "Amount", default, deserialize_with = "optional_number")]
    pub(crate) amount: Option<f64>,
    #[serde(rename = "Address", default, deserialize_with = "empty_string_as_none")]
    pub(crate) address: Option<String>,
    #[serde(rename = "City", default, deserialize_with = "empty_string_as_none")]
    pub(crate) city: Option<String>,
    #[serde(rename = "State", default, deserialize_with = "empty_string_as_none")]
    pub(crate) state: Option<String>,
    #[serde(
        rename = "Zip",
        alias = "ZipCode",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) zip_code: Option<String>,
    #[serde(rename = "Longitude", default, deserialize_with = "optional_number")]
    pub(crate) longitude: Option<f64>,
    #[serde(rename = "Latitude", default, deserialize_with = "optional_number")]
    pub(crate) latitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServiceRow {
    #[serde(
        rename = "OrgID",
        alias = "CSDS_Org_ID",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) org_id: Option<String>,
    #[serde(rename = "VendorID", alias = "CSDS_Svc_ID")]
    pub(crate) service_agency_id: String,
    #[serde(rename = "Address", default, deserialize_with = "empty_string_as_none")]
    pub(crate) address: Option<String>,
    #[serde(rename = "City", default, deserialize_with = "empty_string_as_none")]
    pub(crate) city: Option<String>,
    #[serde(rename = "State", default, deserialize_with = "empty_string_as_none")]
    pub(crate) state: Option<String>,
    #[serde(
        rename = "ZipCode",
        alias = "Zip",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) zip_code: Option<String>,
    #[serde(rename = "Longitude", default, deserialize_with = "optional_number")]
    pub(crate) longitude: Option<f64>,
    #[serde(rename = "Latitude", default, deserialize_with = "optional_number")]
    pub(crate) latitude: Option<f64>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Empty cells are missing values; anything else must parse as a number.
fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = empty_string_as_none(deserializer)? else {
        return Ok(None);
    };

    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(D::Error::custom(format!("invalid number '{raw}'"))),
    }
}
