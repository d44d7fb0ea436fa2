//! Predicates of a molecule template

use super::merge::{
    check_identity, prefer_cardinality, prefer_text, union_ordered, MergeError, UNKNOWN_CARDINALITY,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A property observed on instances of a concept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    /// Predicate URI, the identity of this predicate
    #[serde(rename = "predId")]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "desc", default)]
    pub description: String,
    /// Number of subjects using the predicate, `-1` when unknown
    #[serde(default = "unknown_cardinality")]
    pub cardinality: i64,
    /// Range type identifiers (classes and datatypes)
    #[serde(default)]
    pub ranges: BTreeSet<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
}

fn unknown_cardinality() -> i64 {
    UNKNOWN_CARDINALITY
}

impl Predicate {
    /// Create a predicate labelled with its own URI
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            description: String::new(),
            cardinality: UNKNOWN_CARDINALITY,
            ranges: BTreeSet::new(),
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

    pub fn with_ranges<I, S>(mut self, ranges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_ranges(ranges);
        self
    }

    pub fn add_ranges<I, S>(&mut self, ranges: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ranges.extend(ranges.into_iter().map(Into::into));
    }

    /// Merge with another description of the same predicate
    ///
    /// Returns a new value; neither input is modified. Fails when the two
    /// predicates have different URIs.
    pub fn merge(&self, other: &Predicate) -> Result<Predicate, MergeError> {
        check_identity("predicate", &self.id, &other.id)?;
        Ok(self.merge_unchecked(other))
    }

    pub(crate) fn merge_unchecked(&self, other: &Predicate) -> Predicate {
        Predicate {
            id: self.id.clone(),
            label: prefer_text(&self.label, &other.label),
            description: prefer_text(&self.description, &other.description),
            cardinality: prefer_cardinality(self.cardinality, other.cardinality),
            ranges: self.ranges.union(&other.ranges).cloned().collect(),
            constraints: union_ordered(&self.constraints, &other.constraints),
            policy: self.policy.clone().or_else(|| other.policy.clone()),
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}
