pub mod addresses;
pub mod allocation;
pub mod ingest;
pub mod linkage;
