use super::domain::{NeedsGeocoding, ResolvedLocation, SatelliteLocation};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Output tables written as CSV. The header is written even with zero rows.
pub trait CsvTable: Serialize {
    const HEADERS: &'static [&'static str];
}

impl CsvTable for ResolvedLocation {
    const HEADERS: &'static [&'static str] = &[
        "VendorID",
        "VendorName",
        "Address",
        "City",
        "State",
        "ZipCode",
        "ClusterID",
        "OrgID",
        "ServiceAgencyID",
        "ServiceAddress",
        "ServiceCity",
        "ServiceState",
        "ServiceZipCode",
        "Longitude",
        "Latitude",
        "AggregateAmount",
        "NumLocations",
        "DollarsPerLocation",
        "IsHQFlag",
    ];
}

impl CsvTable for SatelliteLocation {
    const HEADERS: &'static [&'static str] = &[
        "VendorID",
        "VendorName",
        "OrgID",
        "Address",
        "City",
        "State",
        "ZipCode",
        "Longitude",
        "Latitude",
        "DollarsPerLocation",
    ];
}

impl CsvTable for NeedsGeocoding {
    const HEADERS: &'static [&'static str] = &["ID", "Address", "City", "State", "Zip"];
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write CSV output: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush CSV output: {0}")]
    Io(#[from] std::io::Error),
}

pub fn write_table<T: CsvTable, W: Write>(writer: W, rows: &[T]) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(T::HEADERS)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;

    Ok(())
}

pub fn write_table_to_path<T: CsvTable>(path: &Path, rows: &[T]) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    write_table(BufWriter::new(file), rows)
}
