//! Application configuration loaded from YAML

use crate::discovery::DiscoveryConfig;
use crate::federation::{Federation, DEFAULT_MAX_CONCURRENT_SOURCES};
use crate::model::DataSource;
use crate::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Identity of the federation being built
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FederationSettings {
    /// Fixed ID; a random one is generated when absent
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Everything the `rdfmt` binary needs to run an extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub federation: FederationSettings,
    #[serde(default = "default_max_concurrent_sources")]
    pub max_concurrent_sources: usize,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub sources: Vec<DataSource>,
}

fn default_max_concurrent_sources() -> usize {
    DEFAULT_MAX_CONCURRENT_SOURCES
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.federation.name.trim().is_empty() {
            return Err(ConfigError::Invalid("federation name is empty".into()));
        }
        if self.max_concurrent_sources == 0 {
            return Err(ConfigError::Invalid("max_concurrent_sources must be at least 1".into()));
        }
        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.id.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate source id '{}'", source.id)));
            }
        }
        Ok(())
    }

    /// An empty federation with the configured identity and sources
    pub fn build_federation(&self) -> Federation {
        let settings = &self.federation;
        let federation = match &settings.id {
            Some(id) => Federation::with_id(id.clone(), settings.name.clone()),
            None => Federation::new(settings.name.clone()),
        }
        .with_description(settings.description.clone());
        for source in &self.sources {
            federation.add_source(source.clone());
        }
        federation
    }

    pub fn source(&self, id: &str) -> Option<&DataSource> {
        self.sources.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceKind;
    use std::io::Write;

    const YAML: &str = r#"
federation:
  id: lslod
  name: Life science linked data
max_concurrent_sources: 2
discovery:
  collect_stats: false
  denylist:
    - "http://www.w3.org/"
transport:
  timeout_seconds: 30
sources:
  - dsId: drugbank
    url: http://localhost:8890/sparql
    dstype: SPARQL_Endpoint
  - dsId: trials
    url: file:///data/trials.csv
    dstype: LOCAL_CSV
    params:
      delimiter: ","
"#;

    #[test]
    fn loads_full_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let config = AppConfig::load(file.path()).unwrap();

        assert_eq!(config.max_concurrent_sources, 2);
        assert!(!config.discovery.collect_stats);
        assert!(config.discovery.collect_labels);
        assert!(config.discovery.denylist.excludes("http://www.w3.org/ns/ldp#Resource"));
        assert!(!config.discovery.denylist.excludes("http://www.openlinksw.com/schemas/virtrdf#x"));
        assert_eq!(config.transport.timeout_seconds, 30);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.source("trials").unwrap().kind, SourceKind::LocalCsv);
        assert_eq!(config.source("trials").unwrap().params["delimiter"], ",");
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = AppConfig::from_yaml_str("federation:\n  name: demo\n").unwrap();

        assert_eq!(config.max_concurrent_sources, DEFAULT_MAX_CONCURRENT_SOURCES);
        assert_eq!(config.discovery.typing_predicate, "a");
        assert!(config.sources.is_empty());
    }

    #[test]
    fn builds_federation_with_sources() {
        let config = AppConfig::from_yaml_str(YAML).unwrap();
        let federation = config.build_federation();

        assert_eq!(federation.id(), "lslod");
        assert_eq!(federation.source_count(), 2);
        assert!(federation.get_source("drugbank").is_some());
    }

    #[test]
    fn rejects_duplicate_source_ids() {
        let yaml = r#"
federation:
  name: demo
sources:
  - { dsId: a, url: "http://a", dstype: SPARQL_Endpoint }
  - { dsId: a, url: "http://b", dstype: SPARQL_Endpoint }
"#;
        assert!(matches!(AppConfig::from_yaml_str(yaml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_zero_concurrency() {
        let yaml = "federation:\n  name: demo\nmax_concurrent_sources: 0\n";
        assert!(matches!(AppConfig::from_yaml_str(yaml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(AppConfig::load("/nonexistent/rdfmt.yaml"), Err(ConfigError::Io(_))));
    }
}
