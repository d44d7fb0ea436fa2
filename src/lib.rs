//! rdfmt: RDF Molecule Template discovery for federated SPARQL sources
//!
//! Introspects SPARQL endpoints to recover their implicit schema and folds
//! it into RDF Molecule Templates (RDFMTs), one per concept, shared across
//! every source of a federation.
//!
//! # Core Concepts
//!
//! - **Data sources**: endpoints (and other stores) registered in a federation
//! - **RDFMTs**: a concept, its predicates, their ranges, and the sources that contribute them
//! - **Discovery**: paginated, backoff-tolerant schema queries against one endpoint
//! - **Federation**: the merged registry of templates across all sources
//!
//! # Example
//!
//! ```
//! use rdfmt::{DataSource, Federation, Predicate, Rdfmt};
//!
//! let federation = Federation::new("demo");
//! let source = DataSource::sparql("people", "http://localhost:8890/sparql");
//! federation.add_source(source.clone());
//! federation
//!     .add_rdfmt(
//!         Rdfmt::new("http://xmlns.com/foaf/0.1/Person")
//!             .with_predicate(Predicate::new("http://xmlns.com/foaf/0.1/name"))
//!             .with_source(source),
//!     )
//!     .unwrap();
//! assert_eq!(federation.rdfmt_count(), 1);
//! ```

pub mod config;
pub mod discovery;
pub mod federation;
mod model;
pub mod transport;

pub use config::{AppConfig, ConfigError, FederationSettings};
pub use discovery::{DiscoveryConfig, DiscoveryOptions, SchemaDiscoverer, SourceDiscovery};
pub use federation::{
    ExtractMode, ExtractionReport, Federation, FederationError, FederationExtractor, FederationResult,
    FederationSnapshot, Retraction,
};
pub use model::{
    DataSource, MergeError, Predicate, Rdfmt, SourceKey, SourceKind, TemplateType, UNKNOWN_CARDINALITY,
};
pub use transport::{HttpTransport, SparqlTransport, TransportConfig, TransportOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
