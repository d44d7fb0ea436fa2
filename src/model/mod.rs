//! Schema description data model
//!
//! Data sources, predicates and molecule templates, together with the merge
//! policy that reconciles two descriptions of the same identity.

mod merge;
mod predicate;
mod source;
mod template;

pub use merge::{MergeError, UNKNOWN_CARDINALITY};
pub use predicate::Predicate;
pub use source::{DataSource, SourceKey, SourceKind};
pub use template::{Rdfmt, TemplateType};
