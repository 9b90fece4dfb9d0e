//! CSV ingestion for the link, HQ contract, and service agency tables.
//!
//! Schema problems fail fast: a missing column is reported before any row is
//! read, and a cell that cannot be decoded reports its table and line.
//! Zip codes are always kept as text.

mod rows;

use crate::workflows::allocation::{HqAgency, ServiceLocation};
use crate::workflows::linkage::LinkCandidate;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use rows::{ContractRow, LinkRow, ServiceRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Links,
    Contracts,
    Services,
}

impl Table {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Links => "link",
            Self::Contracts => "HQ contract",
            Self::Services => "service agency",
        }
    }

    /// Columns that must be present, each with its accepted spellings.
    fn required_columns(self) -> &'static [&'static [&'static str]] {
        match self {
            Self::Links => &[&["ClusterID"], &["VendorID", "CSDS_Vendor_ID"], &["LinkScore"]],
            Self::Contracts => &[
                &["VendorID", "CSDS_Vendor_ID"],
                &["Amount"],
                &["Address"],
                &["City"],
                &["State"],
                &["Zip", "ZipCode"],
            ],
            Self::Services => &[
                &["OrgID", "CSDS_Org_ID"],
                &["VendorID", "CSDS_Svc_ID"],
                &["Address"],
                &["City"],
                &["State"],
                &["ZipCode", "Zip"],
            ],
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to open {table} table: {source}")]
    Io {
        table: Table,
        #[source]
        source: std::io::Error,
    },
    #[error("{table} table is missing required column '{column}'")]
    MissingColumn { table: Table, column: &'static str },
    #[error(
        "{table} table has more than one '{column}' column (accepted spellings: {})",
        .spellings.join(", ")
    )]
    DuplicateColumn {
        table: Table,
        column: &'static str,
        spellings: &'static [&'static str],
    },
    #[error("{table} table, line {line}: {source}")]
    Malformed {
        table: Table,
        line: u64,
        #[source]
        source: csv::Error,
    },
}

/// The three raw inputs of an allocation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputTables {
    pub links: Vec<LinkCandidate>,
    pub hq_agencies: Vec<HqAgency>,
    pub services: Vec<ServiceLocation>,
}

impl InputTables {
    pub fn from_paths<L, H, S>(links: L, contracts: H, services: S) -> Result<Self, IngestError>
    where
        L: AsRef<Path>,
        H: AsRef<Path>,
        S: AsRef<Path>,
    {
        Self::from_readers(
            open(Table::Links, links)?,
            open(Table::Contracts, contracts)?,
            open(Table::Services, services)?,
        )
    }

    pub fn from_readers<L: Read, H: Read, S: Read>(
        links: L,
        contracts: H,
        services: S,
    ) -> Result<Self, IngestError> {
        let tables = Self {
            links: read_link_candidates(links)?,
            hq_agencies: read_hq_agencies(contracts)?,
            services: read_service_locations(services)?,
        };

        info!(
            links = tables.links.len(),
            hq_agencies = tables.hq_agencies.len(),
            services = tables.services.len(),
            "loaded input tables"
        );

        Ok(tables)
    }
}

fn open<P: AsRef<Path>>(table: Table, path: P) -> Result<std::fs::File, IngestError> {
    std::fs::File::open(path).map_err(|source| IngestError::Io { table, source })
}

pub fn read_link_candidates<R: Read>(reader: R) -> Result<Vec<LinkCandidate>, IngestError> {
    let rows: Vec<LinkRow> = read_rows(Table::Links, reader)?;
    Ok(rows
        .into_iter()
        .map(|row| LinkCandidate {
            cluster_id: row.cluster_id,
            vendor_id: row.vendor_id,
            vendor_name: row.vendor_name,
            link_score: row.link_score,
        })
        .collect())
}

/// Reads contract rows and folds them into one HQ per vendor, in order of
/// first appearance. Address fields come from the vendor's first row; empty
/// amounts add nothing, so a vendor without amounts aggregates to zero.
pub fn read_hq_agencies<R: Read>(reader: R) -> Result<Vec<HqAgency>, IngestError> {
    let rows: Vec<ContractRow> = read_rows(Table::Contracts, reader)?;
    Ok(aggregate_contracts(rows))
}

pub fn read_service_locations<R: Read>(reader: R) -> Result<Vec<ServiceLocation>, IngestError> {
    let rows: Vec<ServiceRow> = read_rows(Table::Services, reader)?;
    Ok(rows
        .into_iter()
        .map(|row| ServiceLocation {
            org_id: row.org_id,
            service_agency_id: row.service_agency_id,
            address: row.address,
            city: row.city,
            state: row.state,
            zip_code: row.zip_code,
            longitude: row.longitude,
            latitude: row.latitude,
        })
        .collect())
}

fn aggregate_contracts(rows: Vec<ContractRow>) -> Vec<HqAgency> {
    let mut agencies: Vec<HqAgency> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let amount = row.amount.unwrap_or(0.0);
        if let Some(&position) = index.get(&row.vendor_id) {
            let agency = &mut agencies[position];
            agency.aggregate_amount += amount;
            if agency.address != row.address || agency.city != row.city {
                warn!(
                    vendor_id = %agency.vendor_id,
                    kept = ?agency.address,
                    ignored = ?row.address,
                    "vendor lists more than one HQ address; keeping the first"
                );
            }
            continue;
        }

        index.insert(row.vendor_id.clone(), agencies.len());
        agencies.push(HqAgency {
            vendor_id: row.vendor_id,
            vendor_name: row.vendor_name,
            aggregate_amount: amount,
            address: row.address,
            city: row.city,
            state: row.state,
            zip_code: row.zip_code,
            longitude: row.longitude,
            latitude: row.latitude,
        });
    }

    agencies
}

fn read_rows<T, R>(table: Table, reader: R) -> Result<Vec<T>, IngestError>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|source| malformed(table, source))?
        .clone();
    check_columns(table, &headers)?;

    let mut rows = Vec::new();
    for record in csv_reader.deserialize::<T>() {
        rows.push(record.map_err(|source| malformed(table, source))?);
    }

    Ok(rows)
}

fn check_columns(table: Table, headers: &csv::StringRecord) -> Result<(), IngestError> {
    for &spellings in table.required_columns() {
        let found = headers
            .iter()
            .filter(|header| spellings.iter().any(|name| name == header))
            .count();
        if found == 0 {
            return Err(IngestError::MissingColumn {
                table,
                column: spellings[0],
            });
        }
        // Two spellings of one column would both feed the same field.
        if found > 1 {
            return Err(IngestError::DuplicateColumn {
                table,
                column: spellings[0],
                spellings,
            });
        }
    }

    Ok(())
}

fn malformed(table: Table, source: csv::Error) -> IngestError {
    let line = source.position().map_or(0, |position| position.line());
    IngestError::Malformed {
        table,
        line,
        source,
    }
}
