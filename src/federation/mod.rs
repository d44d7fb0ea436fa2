//! Federations: registered sources and their merged molecule templates

mod extractor;
mod registry;

pub use extractor::{ExtractMode, ExtractionReport, FederationExtractor, DEFAULT_MAX_CONCURRENT_SOURCES};
pub use registry::{Federation, FederationError, FederationResult, FederationSnapshot, Retraction};
