//! Schema discovery over SPARQL endpoints
//!
//! The [`Paginator`] turns one logical query into bounded requests with
//! page-size backoff; the [`SchemaDiscoverer`] drives it to enumerate
//! concepts, predicates, ranges, labels and statistics.

mod config;
mod discoverer;
mod paginator;
pub mod queries;
mod rows;

pub use config::{
    Denylist, DiscoveryConfig, DiscoveryOptions, PageSizes, SamplingConfig, DEFAULT_DENYLIST,
    RDFS_LABEL, RDFS_RANGE, RDFS_SUBCLASS_OF,
};
pub use discoverer::{ConceptRecord, PredicateRecord, SchemaDiscoverer, SourceDiscovery};
pub use paginator::{paged_query, PageStatus, PagedResult, Paginator};
pub use rows::{ConceptRow, CountRow, InstanceRow, LabelRow, PredicateRow, RangeRow, SuperClassRow};
