//! Data source descriptions registered in a federation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Kind of system a data source lives in
///
/// Only [`SourceKind::SparqlEndpoint`] is introspected by discovery; every
/// other kind is recorded so the federation knows about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "SPARQL_Endpoint")]
    SparqlEndpoint,
    #[serde(rename = "MongoDB")]
    MongoDb,
    #[serde(rename = "Neo4j")]
    Neo4j,
    #[serde(rename = "MySQL")]
    MySql,
    #[serde(rename = "Postgres")]
    Postgres,

    #[serde(rename = "SPARK_CSV")]
    SparkCsv,
    #[serde(rename = "SPARK_TSV")]
    SparkTsv,
    #[serde(rename = "SPARK_JSON")]
    SparkJson,
    #[serde(rename = "SPARK_XML")]
    SparkXml,

    #[serde(rename = "HADOOP_CSV")]
    HadoopCsv,
    #[serde(rename = "HADOOP_TSV")]
    HadoopTsv,
    #[serde(rename = "HADOOP_JSON")]
    HadoopJson,
    #[serde(rename = "HADOOP_XML")]
    HadoopXml,

    #[serde(rename = "REST_Service")]
    RestService,

    #[serde(rename = "LOCAL_CSV")]
    LocalCsv,
    #[serde(rename = "LOCAL_TSV")]
    LocalTsv,
    #[serde(rename = "LOCAL_JSON")]
    LocalJson,
    #[serde(rename = "LOCAL_XML")]
    LocalXml,
    #[serde(rename = "LOCAL_RDF")]
    LocalRdf,

    #[serde(rename = "LOCAL_FOLDER")]
    LocalFolder,
    #[serde(rename = "SPARK_FOLDER")]
    SparkFolder,
    #[serde(rename = "HADOOP_FOLDER")]
    HadoopFolder,

    #[serde(rename = "csv")]
    Csv,
    #[serde(rename = "TSV")]
    Tsv,
    #[serde(rename = "XML")]
    Xml,
    #[serde(rename = "JSON")]
    Json,
    #[serde(rename = "RDF")]
    Rdf,
}

impl SourceKind {
    /// Whether discovery can introspect this kind of source
    pub fn is_queryable(&self) -> bool {
        matches!(self, Self::SparqlEndpoint)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Reuse the serialized name so logs and JSON agree
        match serde_json::to_value(self) {
            Ok(serde_json::Value::String(name)) => write!(f, "{}", name),
            _ => write!(f, "{:?}", self),
        }
    }
}

/// A data source in a federation
///
/// Identity is the `(id, url)` pair: equality and hashing ignore every
/// other attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    #[serde(rename = "dsId")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub url: String,
    #[serde(rename = "dstype")]
    pub kind: SourceKind,
    /// Free-form configuration parameters
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(rename = "desc", default)]
    pub description: String,
    /// Access policy attached after registration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
}

impl DataSource {
    pub fn new(id: impl Into<String>, kind: SourceKind, url: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            url: url.into(),
            kind,
            params: BTreeMap::new(),
            description: String::new(),
            policy: None,
        }
    }

    /// Shorthand for a SPARQL endpoint source
    pub fn sparql(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(id, SourceKind::SparqlEndpoint, url)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policy = Some(policy.into());
        self
    }

    /// Registry key derived from the identity pair
    pub fn key(&self) -> SourceKey {
        SourceKey {
            id: self.id.clone(),
            url: self.url.clone(),
        }
    }
}

impl PartialEq for DataSource {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.url == other.url
    }
}

impl Eq for DataSource {}

impl Hash for DataSource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.url.hash(state);
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Identity of a [`DataSource`], usable as a map key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey {
    pub id: String,
    pub url: String,
}
