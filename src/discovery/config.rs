//! Discovery settings and the infrastructure-namespace denylist

use serde::{Deserialize, Serialize};

pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const RDFS_RANGE: &str = "http://www.w3.org/2000/01/rdf-schema#range";
pub const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";

/// Namespaces that describe datasets and vocabularies rather than the domain
pub const DEFAULT_DENYLIST: &[&str] = &[
    "http://www.w3.org/ns/sparql-service-description",
    "http://www.openlinksw.com/schemas/virtrdf#",
    "http://www.w3.org/2000/01/rdf-schema#",
    "http://www.w3.org/1999/02/22-rdf-syntax-ns#",
    "http://www.w3.org/2002/07/owl#",
    "http://purl.org/dc/terms/Dataset",
    "http://www4.wiwiss.fu-berlin.de/bizer/bsbm/v01/instances/ProductType",
    "nodeID://",
];

/// URI fragments excluded from discovered concepts and ranges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Denylist(Vec<String>);

impl Denylist {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(entries.into_iter().map(Into::into).collect())
    }

    /// An empty denylist that excludes nothing
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// True if `uri` contains any denylisted fragment
    pub fn excludes(&self, uri: &str) -> bool {
        self.0.iter().any(|entry| uri.contains(entry.as_str()))
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }
}

impl Default for Denylist {
    fn default() -> Self {
        Self::new(DEFAULT_DENYLIST.iter().copied())
    }
}

/// Page sizes used for each family of discovery queries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSizes {
    pub concepts: usize,
    pub predicates: usize,
    pub ranges: usize,
    pub super_classes: usize,
    pub concept_labels: usize,
    pub predicate_labels: usize,
    pub cardinality: usize,
    pub sampled_predicates: usize,
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            concepts: 50,
            predicates: 15,
            ranges: 50,
            super_classes: 15,
            concept_labels: 50,
            predicate_labels: 5,
            cardinality: 10,
            sampled_predicates: 100,
        }
    }
}

/// Settings for the instance-sampling fallback
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Maximum number of instances to sample
    pub max_instances: usize,
    /// Page size when selecting instances
    pub page_size: usize,
    /// Instances per predicate query
    pub batch_size: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_instances: 100,
            page_size: 50,
            batch_size: 10,
        }
    }
}

/// Configuration for schema discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Typing relation: `a` or a full URI
    pub typing_predicate: String,
    /// Relation holding human-readable labels
    pub labeling_predicate: String,
    /// Language tag labels are filtered to
    pub label_language: String,
    pub collect_labels: bool,
    pub collect_stats: bool,
    /// Identifiers per combined label query
    pub label_batch_size: usize,
    pub page_sizes: PageSizes,
    pub sampling: SamplingConfig,
    pub denylist: Denylist,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            typing_predicate: "a".to_string(),
            labeling_predicate: RDFS_LABEL.to_string(),
            label_language: "en".to_string(),
            collect_labels: true,
            collect_stats: true,
            label_batch_size: 10,
            page_sizes: PageSizes::default(),
            sampling: SamplingConfig::default(),
            denylist: Denylist::default(),
        }
    }
}

impl DiscoveryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config for a quick structural pass: no labels, no statistics
    pub fn structure_only() -> Self {
        Self {
            collect_labels: false,
            collect_stats: false,
            ..Self::new()
        }
    }

    pub fn with_denylist(mut self, denylist: Denylist) -> Self {
        self.denylist = denylist;
        self
    }

    /// Per-call options derived from this configuration
    pub fn options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            typing_predicate: self.typing_predicate.clone(),
            labeling_predicate: Some(self.labeling_predicate.clone()),
            collect_labels: self.collect_labels,
            collect_stats: self.collect_stats,
            limit: None,
        }
    }
}

/// Options for a single discovery call
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub typing_predicate: String,
    /// Labeling relation; the configured default when `None`
    pub labeling_predicate: Option<String>,
    pub collect_labels: bool,
    pub collect_stats: bool,
    /// Page size override for the main enumeration query
    pub limit: Option<usize>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        DiscoveryConfig::default().options()
    }
}

impl DiscoveryOptions {
    pub fn with_labels(mut self, collect: bool) -> Self {
        self.collect_labels = collect;
        self
    }

    pub fn with_stats(mut self, collect: bool) -> Self {
        self.collect_stats = collect;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_typing_predicate(mut self, predicate: impl Into<String>) -> Self {
        self.typing_predicate = predicate.into();
        self
    }
}
