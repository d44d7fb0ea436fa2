//! RDF molecule templates: the discovered description of one concept

use super::merge::{
    check_identity, prefer_cardinality, prefer_text, union_ordered, MergeError, UNKNOWN_CARDINALITY,
};
use super::predicate::Predicate;
use super::source::DataSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether a template was found through the typing relation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    #[default]
    Typed,
    Untyped,
}

/// An RDF molecule template (RDF-MT)
///
/// Describes a concept: its predicates, their ranges, and the data sources
/// that hold instances of it. Predicates are keyed by URI, so a template can
/// never carry two predicates with the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rdfmt {
    /// Concept URI, the identity of this template
    #[serde(rename = "mtId")]
    pub id: String,
    #[serde(rename = "mttype", default)]
    pub template_type: TemplateType,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "desc", default)]
    pub description: String,
    /// Number of instances, `-1` when unknown
    #[serde(default = "unknown_cardinality")]
    pub cardinality: i64,
    /// Superclass closure, deduplicated
    #[serde(rename = "subClassOf", default)]
    pub sub_class_of: Vec<String>,
    #[serde(default, with = "predicate_list")]
    pub predicates: BTreeMap<String, Predicate>,
    /// Contributing data sources
    #[serde(rename = "datasources", default)]
    pub sources: Vec<DataSource>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
}

fn unknown_cardinality() -> i64 {
    UNKNOWN_CARDINALITY
}

impl Rdfmt {
    /// Create a typed template labelled with its own URI
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            template_type: TemplateType::Typed,
            description: String::new(),
            cardinality: UNKNOWN_CARDINALITY,
            sub_class_of: Vec::new(),
            predicates: BTreeMap::new(),
            sources: Vec::new(),
            constraints: Vec::new(),
            policy: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_cardinality(mut self, cardinality: i64) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn with_type(mut self, template_type: TemplateType) -> Self {
        self.template_type = template_type;
        self
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.add_predicate(predicate);
        self
    }

    pub fn with_source(mut self, source: DataSource) -> Self {
        self.add_source(source);
        self
    }

    pub fn with_super_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for class in classes {
            self.add_super_class(class);
        }
        self
    }

    /// Add a predicate, folding it into an existing entry with the same URI
    pub fn add_predicate(&mut self, predicate: Predicate) {
        match self.predicates.get_mut(&predicate.id) {
            Some(existing) => *existing = existing.merge_unchecked(&predicate),
            None => {
                self.predicates.insert(predicate.id.clone(), predicate);
            }
        }
    }

    pub fn add_super_class(&mut self, class: impl Into<String>) {
        let class = class.into();
        if !self.sub_class_of.contains(&class) {
            self.sub_class_of.push(class);
        }
    }

    /// Record a contributing source; returns false if it was already listed
    pub fn add_source(&mut self, source: DataSource) -> bool {
        if self.sources.contains(&source) {
            return false;
        }
        self.sources.push(source);
        true
    }

    /// Drop a contributing source; returns true if it was listed
    pub fn remove_source(&mut self, source: &DataSource) -> bool {
        let before = self.sources.len();
        self.sources.retain(|s| s != source);
        self.sources.len() != before
    }

    pub fn has_source(&self, source: &DataSource) -> bool {
        self.sources.contains(source)
    }

    /// True when `source` is the one and only contributor
    pub fn is_sole_source(&self, source: &DataSource) -> bool {
        self.sources.len() == 1 && self.has_source(source)
    }

    pub fn predicate(&self, id: &str) -> Option<&Predicate> {
        self.predicates.get(id)
    }

    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }

    /// Merge with another description of the same concept
    ///
    /// Returns a new value; neither input is modified. Shared predicates are
    /// merged recursively, all others are carried over as-is.
    pub fn merge(&self, other: &Rdfmt) -> Result<Rdfmt, MergeError> {
        check_identity("molecule template", &self.id, &other.id)?;

        let mut predicates = self.predicates.clone();
        for (id, theirs) in &other.predicates {
            match predicates.get_mut(id) {
                Some(ours) => *ours = ours.merge(theirs)?,
                None => {
                    predicates.insert(id.clone(), theirs.clone());
                }
            }
        }

        Ok(Rdfmt {
            id: self.id.clone(),
            template_type: self.template_type,
            label: prefer_text(&self.label, &other.label),
            description: prefer_text(&self.description, &other.description),
            cardinality: prefer_cardinality(self.cardinality, other.cardinality),
            sub_class_of: union_ordered(&self.sub_class_of, &other.sub_class_of),
            predicates,
            sources: union_ordered(&self.sources, &other.sources),
            constraints: union_ordered(&self.constraints, &other.constraints),
            policy: self.policy.clone().or_else(|| other.policy.clone()),
        })
    }
}

impl std::fmt::Display for Rdfmt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Serializes the predicate map as a plain list of predicates
mod predicate_list {
    use super::Predicate;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(map: &BTreeMap<String, Predicate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(map.values())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<String, Predicate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let list = Vec::<Predicate>::deserialize(deserializer)?;
        let mut map: BTreeMap<String, Predicate> = BTreeMap::new();
        for predicate in list {
            match map.get_mut(&predicate.id) {
                Some(existing) => *existing = existing.merge_unchecked(&predicate),
                None => {
                    map.insert(predicate.id.clone(), predicate);
                }
            }
        }
        Ok(map)
    }
}
