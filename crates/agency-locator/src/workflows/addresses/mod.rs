//! Address structure, pairwise matching, and in-group consolidation.

mod dedup;
mod matcher;
mod normalizer;
mod parser;
mod vocabulary;

pub use dedup::{
    AddressRecord, ClusterDeduplicator, ConsolidationStrategy, DedupReport, GroupConsolidation,
    UnknownStrategy,
};
pub use matcher::{compare_structured, AddressComparison, AddressMatcher};
pub use parser::{AddressParser, ComponentKind, RuleBasedParser, StructuredAddress};
