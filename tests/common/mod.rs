//! Common test utilities for federation tests
//!
//! `EndpointFixture` describes the schema an endpoint should expose and
//! compiles it into a `MockTransport` answering the discovery queries.

use rdfmt::transport::{row, MockRouter, MockTransport, Row};
use rdfmt::{DiscoveryConfig, FederationExtractor, SchemaDiscoverer};
use std::sync::Arc;

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_INT: &str = "http://www.w3.org/2001/XMLSchema#int";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

struct PredicateFixture {
    uri: String,
    datatype: String,
    count: i64,
}

struct ConceptFixture {
    uri: String,
    count: i64,
    predicates: Vec<PredicateFixture>,
}

/// Schema of one mocked endpoint
#[derive(Default)]
pub struct EndpointFixture {
    concepts: Vec<ConceptFixture>,
    concept_page_cap: Option<usize>,
    reject_all: bool,
}

impl EndpointFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a concept with `count` instances and `(predicate, datatype, count)` triples
    pub fn concept(mut self, uri: &str, count: i64, predicates: &[(&str, &str, i64)]) -> Self {
        self.concepts.push(ConceptFixture {
            uri: uri.to_string(),
            count,
            predicates: predicates
                .iter()
                .map(|(p, dt, n)| PredicateFixture {
                    uri: p.to_string(),
                    datatype: dt.to_string(),
                    count: *n,
                })
                .collect(),
        });
        self
    }

    /// Reject concept pages larger than `cap`
    pub fn with_concept_page_cap(mut self, cap: usize) -> Self {
        self.concept_page_cap = Some(cap);
        self
    }

    /// Reject every query, like an endpoint that is down
    pub fn unreachable(mut self) -> Self {
        self.reject_all = true;
        self
    }

    pub fn build(&self) -> Arc<MockTransport> {
        if self.reject_all {
            return Arc::new(MockTransport::new().with_rejection(&["SELECT"]));
        }

        let concept_rows: Vec<Row> = self.concepts.iter().map(|c| row([("t", c.uri.as_str())])).collect();
        let mut mock = match self.concept_page_cap {
            Some(cap) => MockTransport::new().with_page_cap(&["?t WHERE"], cap, concept_rows),
            None => MockTransport::new().with_rows(&["?t WHERE"], concept_rows),
        };

        for concept in &self.concepts {
            let typed = format!("a <{}>", concept.uri);
            let counted = format!("{} }}", typed);
            let used_by = format!("{} .", typed);
            mock = mock
                .with_rows(&["COUNT", counted.as_str()], vec![count_row(concept.count)])
                .with_rows(
                    &["?p WHERE", used_by.as_str()],
                    concept.predicates.iter().map(|p| row([("p", p.uri.as_str())])).collect(),
                );
            for predicate in &concept.predicates {
                let used = format!("{} . ?s <{}>", typed, predicate.uri);
                mock = mock
                    .with_rows(&["COUNT", used.as_str()], vec![count_row(predicate.count)])
                    .with_rows(
                        &["DATATYPE", used.as_str()],
                        vec![row([("r", predicate.datatype.as_str())])],
                    );
            }
        }
        Arc::new(mock)
    }
}

fn count_row(count: i64) -> Row {
    row([(
        "card",
        format!("{}^^<http://www.w3.org/2001/XMLSchema#integer>", count),
    )])
}

/// Discovery settings for tests: statistics on, labels off
pub fn test_config() -> DiscoveryConfig {
    let mut config = DiscoveryConfig::new();
    config.collect_labels = false;
    config
}

/// An extractor serving each `(endpoint, fixture)` pair
pub fn extractor_for(endpoints: &[(&str, &EndpointFixture)]) -> FederationExtractor {
    let router = endpoints
        .iter()
        .fold(MockRouter::new(), |router, (url, fixture)| router.with_route(*url, fixture.build()));
    let discoverer = SchemaDiscoverer::new(Arc::new(router), test_config());
    FederationExtractor::new(Arc::new(discoverer)).with_max_concurrent_sources(2)
}
