//! Federation: the merged schema view over a group of data sources

use crate::model::{DataSource, MergeError, Rdfmt, SourceKey};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur in federation operations
#[derive(Debug, Error)]
pub enum FederationError {
    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for federation operations
pub type FederationResult<T> = Result<T, FederationError>;

/// What a source retraction did to the stored templates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Retraction {
    /// Templates deleted because the source was their only contributor
    pub removed: Vec<String>,
    /// Templates that lost the source but are still backed by others
    pub detached: Vec<String>,
}

/// Serialized form of a federation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederationSnapshot {
    #[serde(rename = "fedId")]
    pub id: String,
    pub name: String,
    #[serde(rename = "desc", default)]
    pub description: String,
    #[serde(default)]
    pub rdfmts: Vec<Rdfmt>,
    #[serde(default)]
    pub sources: Vec<DataSource>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A federation of data sources and their merged molecule templates
///
/// Templates are keyed by concept URI. Incoming templates are folded into
/// the stored entry under the map's entry lock, so at most one merge per
/// concept runs at a time while different concepts merge independently.
#[derive(Debug)]
pub struct Federation {
    id: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    sources: DashMap<SourceKey, DataSource>,
    rdfmts: DashMap<String, Rdfmt>,
}

impl Federation {
    /// Create an empty federation with a random ID
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), name)
    }

    /// Create an empty federation with a specific ID
    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            created_at: Utc::now(),
            sources: DashMap::new(),
            rdfmts: DashMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // === Sources ===

    /// Register a source; returns false if it was already registered
    ///
    /// Re-registering replaces the stored descriptive fields.
    pub fn add_source(&self, source: DataSource) -> bool {
        self.sources.insert(source.key(), source).is_none()
    }

    /// Unregister a source
    ///
    /// Templates that list the source keep it; use
    /// [`Federation::retract_source`] to withdraw its contribution.
    pub fn remove_source(&self, source: &DataSource) -> Option<DataSource> {
        self.sources.remove(&source.key()).map(|(_, s)| s)
    }

    /// Register `source`, retiring any registered source with the same ID
    /// but a different URL
    ///
    /// The retired source is retracted from every template, since its
    /// identity no longer matches anything that will be rediscovered.
    pub fn replace_source(&self, source: DataSource) -> Option<Retraction> {
        let stale = self
            .sources
            .iter()
            .find(|entry| entry.key().id == source.id && entry.key().url != source.url)
            .map(|entry| entry.value().clone());
        let retraction = stale.map(|old| {
            self.remove_source(&old);
            self.retract_source(&old)
        });
        self.add_source(source);
        retraction
    }

    pub fn has_source(&self, source: &DataSource) -> bool {
        self.sources.contains_key(&source.key())
    }

    /// Look up a registered source by its ID
    pub fn get_source(&self, id: &str) -> Option<DataSource> {
        self.sources
            .iter()
            .find(|entry| entry.key().id == id)
            .map(|entry| entry.value().clone())
    }

    /// All registered sources, ordered by identity
    pub fn sources(&self) -> Vec<DataSource> {
        let mut sources: Vec<DataSource> = self.sources.iter().map(|r| r.value().clone()).collect();
        sources.sort_by(|a, b| a.key().cmp(&b.key()));
        sources
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    // === Molecule templates ===

    /// Fold a template into the federation
    ///
    /// A template with a new concept URI is inserted as-is; otherwise the
    /// stored entry is replaced by its merge with the incoming one.
    pub fn add_rdfmt(&self, rdfmt: Rdfmt) -> Result<(), MergeError> {
        match self.rdfmts.entry(rdfmt.id.clone()) {
            Entry::Occupied(mut stored) => {
                let merged = stored.get().merge(&rdfmt)?;
                stored.insert(merged);
            }
            Entry::Vacant(slot) => {
                slot.insert(rdfmt);
            }
        }
        Ok(())
    }

    /// Fold several templates; returns how many were folded
    pub fn add_rdfmts<I>(&self, rdfmts: I) -> Result<usize, MergeError>
    where
        I: IntoIterator<Item = Rdfmt>,
    {
        let mut count = 0;
        for rdfmt in rdfmts {
            self.add_rdfmt(rdfmt)?;
            count += 1;
        }
        Ok(count)
    }

    pub fn get_rdfmt(&self, id: &str) -> Option<Rdfmt> {
        self.rdfmts.get(id).map(|r| r.clone())
    }

    pub fn remove_rdfmt(&self, id: &str) -> Option<Rdfmt> {
        self.rdfmts.remove(id).map(|(_, mt)| mt)
    }

    /// All templates, ordered by concept URI
    pub fn rdfmts(&self) -> Vec<Rdfmt> {
        let mut rdfmts: Vec<Rdfmt> = self.rdfmts.iter().map(|r| r.value().clone()).collect();
        rdfmts.sort_by(|a, b| a.id.cmp(&b.id));
        rdfmts
    }

    pub fn rdfmt_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.rdfmts.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Templates the given source contributes to
    pub fn rdfmts_from_source(&self, source: &DataSource) -> Vec<Rdfmt> {
        let mut rdfmts: Vec<Rdfmt> = self
            .rdfmts
            .iter()
            .filter(|r| r.value().has_source(source))
            .map(|r| r.value().clone())
            .collect();
        rdfmts.sort_by(|a, b| a.id.cmp(&b.id));
        rdfmts
    }

    pub fn rdfmt_count(&self) -> usize {
        self.rdfmts.len()
    }

    pub fn clear_rdfmts(&self) {
        self.rdfmts.clear();
    }

    /// Withdraw a source's contribution from every template
    ///
    /// Templates backed only by `source` are deleted; the others just drop
    /// it from their contributors.
    pub fn retract_source(&self, source: &DataSource) -> Retraction {
        let mut retraction = Retraction::default();
        self.rdfmts.retain(|id, mt| {
            if !mt.has_source(source) {
                return true;
            }
            if mt.is_sole_source(source) {
                retraction.removed.push(id.clone());
                false
            } else {
                mt.remove_source(source);
                retraction.detached.push(id.clone());
                true
            }
        });
        retraction.removed.sort();
        retraction.detached.sort();
        retraction
    }

    // === Serialization ===

    pub fn snapshot(&self) -> FederationSnapshot {
        FederationSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            rdfmts: self.rdfmts(),
            sources: self.sources(),
            created_at: Some(self.created_at),
        }
    }

    /// Rebuild a federation from its serialized form
    ///
    /// Duplicate templates in the snapshot are merged.
    pub fn from_snapshot(snapshot: FederationSnapshot) -> FederationResult<Self> {
        let mut federation = Self::with_id(snapshot.id, snapshot.name).with_description(snapshot.description);
        if let Some(created_at) = snapshot.created_at {
            federation.created_at = created_at;
        }
        for source in snapshot.sources {
            federation.add_source(source);
        }
        federation.add_rdfmts(snapshot.rdfmts)?;
        Ok(federation)
    }

    pub fn to_json_string(&self) -> FederationResult<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    pub fn from_json_str(json: &str) -> FederationResult<Self> {
        let snapshot: FederationSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }
}

impl std::fmt::Display for Federation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}
