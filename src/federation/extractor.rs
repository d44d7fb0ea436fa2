//! Federation-wide extraction
//!
//! Sources are discovered concurrently, bounded by a semaphore. Their
//! templates flow back to one collector that folds them into the federation
//! in source order, so the receiver of each merge does not depend on which
//! endpoint answered first.

use super::registry::{Federation, FederationError, FederationResult};
use crate::discovery::{SchemaDiscoverer, SourceDiscovery};
use crate::model::DataSource;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Default number of sources discovered at once
pub const DEFAULT_MAX_CONCURRENT_SOURCES: usize = 4;

/// What to do with templates already in the federation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtractMode {
    /// Drop every stored template first
    Replace,
    /// Fold new templates into the stored ones
    #[default]
    Merge,
}

/// Outcome of an extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub sources_discovered: usize,
    /// Sources whose kind is not introspected
    pub sources_skipped: usize,
    /// Sources that could not be enumerated, whose discovery task died, or
    /// whose templates did not merge
    pub sources_failed: usize,
    pub templates_folded: usize,
}

impl ExtractionReport {
    pub fn is_clean(&self) -> bool {
        self.sources_failed == 0
    }
}

/// Runs discovery over the sources of a federation
pub struct FederationExtractor {
    discoverer: Arc<SchemaDiscoverer>,
    semaphore: Arc<Semaphore>,
}

impl FederationExtractor {
    pub fn new(discoverer: Arc<SchemaDiscoverer>) -> Self {
        Self {
            discoverer,
            semaphore: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT_SOURCES)),
        }
    }

    /// Limit how many sources are discovered at once (at least one)
    pub fn with_max_concurrent_sources(mut self, limit: usize) -> Self {
        self.semaphore = Arc::new(Semaphore::new(limit.max(1)));
        self
    }

    pub fn discoverer(&self) -> &SchemaDiscoverer {
        &self.discoverer
    }

    /// Discover every registered source and fold the results in
    ///
    /// A source that fails is logged and counted; the others still land.
    /// Results are folded in [`Federation::sources`] order.
    pub async fn extract_molecules(
        &self,
        federation: &Federation,
        mode: ExtractMode,
    ) -> ExtractionReport {
        if mode == ExtractMode::Replace {
            debug!(federation = %federation, "clearing stored templates");
            federation.clear_rdfmts();
        }

        let mut report = ExtractionReport::default();
        let sources = federation.sources();
        let mut tasks: JoinSet<(usize, SourceDiscovery)> = JoinSet::new();

        for (position, source) in sources.iter().enumerate() {
            if !source.kind.is_queryable() {
                info!(source = %source, kind = %source.kind, "source kind not introspected, skipping");
                report.sources_skipped += 1;
                continue;
            }
            let discoverer = self.discoverer.clone();
            let semaphore = self.semaphore.clone();
            let source = source.clone();
            tasks.spawn(async move {
                // Closed only if the semaphore is dropped, which cannot happen while we hold it
                let _permit = semaphore.acquire_owned().await.ok();
                (position, discoverer.discover_source(&source).await)
            });
        }

        let mut discovered: Vec<Option<SourceDiscovery>> = vec![None; sources.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, discovery)) => discovered[position] = Some(discovery),
                Err(e) => {
                    warn!(error = %e, "discovery task failed");
                    report.sources_failed += 1;
                }
            }
        }

        for (source, discovery) in sources.iter().zip(discovered) {
            if let Some(discovery) = discovery {
                fold(federation, source, discovery, &mut report);
            }
        }

        info!(
            federation = %federation,
            discovered = report.sources_discovered,
            skipped = report.sources_skipped,
            failed = report.sources_failed,
            templates = federation.rdfmt_count(),
            "extraction finished"
        );
        report
    }

    /// Withdraw a source's contribution and discover it again
    pub async fn extract_source_molecules(
        &self,
        federation: &Federation,
        source: &DataSource,
    ) -> FederationResult<ExtractionReport> {
        if !federation.has_source(source) {
            return Err(FederationError::SourceNotFound(source.id.clone()));
        }

        let retraction = federation.retract_source(source);
        debug!(
            source = %source,
            removed = retraction.removed.len(),
            detached = retraction.detached.len(),
            "source retracted"
        );

        let mut report = ExtractionReport::default();
        if !source.kind.is_queryable() {
            report.sources_skipped = 1;
            return Ok(report);
        }

        let discovery = self.discoverer.discover_source(source).await;
        fold(federation, source, discovery, &mut report);
        Ok(report)
    }
}

/// Merge one source's templates; a failed enumeration still folds what it found
fn fold(federation: &Federation, source: &DataSource, discovery: SourceDiscovery, report: &mut ExtractionReport) {
    let failed = discovery.is_failed();
    let mut folded = 0;
    for template in discovery.templates {
        if let Err(e) = federation.add_rdfmt(template) {
            warn!(source = %source, error = %e, "template did not merge");
            report.sources_failed += 1;
            report.templates_folded += folded;
            return;
        }
        folded += 1;
    }
    debug!(source = %source, templates = folded, "source folded");
    if failed {
        report.sources_failed += 1;
    } else {
        report.sources_discovered += 1;
    }
    report.templates_folded += folded;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::DiscoveryConfig;
    use crate::model::{Rdfmt, SourceKind};
    use crate::transport::{row, MockRouter, MockTransport};
    use std::time::Duration;

    const PERSON: &str = "http://xmlns.com/foaf/0.1/Person";
    const PLACE: &str = "http://schema.org/Place";
    const NAME: &str = "http://xmlns.com/foaf/0.1/name";
    const AGE: &str = "http://xmlns.com/foaf/0.1/age";

    fn endpoint(concepts: &[&str], predicates: &[&str]) -> Arc<MockTransport> {
        Arc::new(
            MockTransport::new()
                .with_rows(&["?t WHERE"], concepts.iter().map(|c| row([("t", *c)])).collect())
                .with_rows(&["?p WHERE"], predicates.iter().map(|p| row([("p", *p)])).collect()),
        )
    }

    fn setup() -> (Federation, FederationExtractor, DataSource, DataSource) {
        let a = DataSource::sparql("a", "http://a/sparql");
        let b = DataSource::sparql("b", "http://b/sparql");
        let router = MockRouter::new()
            .with_route("http://a/sparql", endpoint(&[PERSON], &[NAME]))
            .with_route("http://b/sparql", endpoint(&[PERSON, PLACE], &[AGE]));

        let discoverer = SchemaDiscoverer::new(Arc::new(router), DiscoveryConfig::structure_only());
        let extractor = FederationExtractor::new(Arc::new(discoverer)).with_max_concurrent_sources(2);

        let federation = Federation::new("test");
        federation.add_source(a.clone());
        federation.add_source(b.clone());
        (federation, extractor, a, b)
    }

    #[tokio::test]
    async fn extraction_merges_sources_by_concept() {
        let (federation, extractor, a, b) = setup();

        let report = extractor.extract_molecules(&federation, ExtractMode::Merge).await;

        assert_eq!(report.sources_discovered, 2);
        assert_eq!(report.templates_folded, 3);
        assert!(report.is_clean());
        assert_eq!(federation.rdfmt_count(), 2);

        let person = federation.get_rdfmt(PERSON).unwrap();
        assert_eq!(person.sources.len(), 2);
        assert!(person.has_source(&a) && person.has_source(&b));
        assert!(person.predicate(NAME).is_some());
        assert!(person.predicate(AGE).is_some());

        let place = federation.get_rdfmt(PLACE).unwrap();
        assert!(place.is_sole_source(&b));
    }

    #[tokio::test]
    async fn replace_mode_drops_stale_templates() {
        let (federation, extractor, _, _) = setup();
        federation.add_rdfmt(Rdfmt::new("http://stale/Concept")).unwrap();

        extractor.extract_molecules(&federation, ExtractMode::Merge).await;
        assert!(federation.get_rdfmt("http://stale/Concept").is_some());

        extractor.extract_molecules(&federation, ExtractMode::Replace).await;
        assert!(federation.get_rdfmt("http://stale/Concept").is_none());
        assert_eq!(federation.rdfmt_count(), 2);
    }

    #[tokio::test]
    async fn unqueryable_sources_are_skipped() {
        let (federation, extractor, _, _) = setup();
        federation.add_source(DataSource::new("files", SourceKind::LocalJson, "file:///data"));

        let report = extractor.extract_molecules(&federation, ExtractMode::Merge).await;

        assert_eq!(report.sources_skipped, 1);
        assert_eq!(report.sources_discovered, 2);
    }

    #[tokio::test]
    async fn source_refresh_retracts_then_rediscovers() {
        let (federation, extractor, a, b) = setup();
        extractor.extract_molecules(&federation, ExtractMode::Merge).await;
        let before = federation.rdfmts();

        let report = extractor.extract_source_molecules(&federation, &b).await.unwrap();

        assert_eq!(report.sources_discovered, 1);
        assert_eq!(report.templates_folded, 2);
        assert_eq!(federation.rdfmt_count(), 2);
        let person = federation.get_rdfmt(PERSON).unwrap();
        assert!(person.has_source(&a) && person.has_source(&b));
        assert_eq!(person.predicates, before.iter().find(|m| m.id == PERSON).unwrap().predicates);
    }

    #[tokio::test]
    async fn refreshing_unknown_source_fails() {
        let (federation, extractor, _, _) = setup();
        let stranger = DataSource::sparql("c", "http://c/sparql");

        let result = extractor.extract_source_molecules(&federation, &stranger).await;

        assert!(matches!(result, Err(FederationError::SourceNotFound(id)) if id == "c"));
    }

    fn counted_endpoint(count: &str) -> MockTransport {
        MockTransport::new()
            .with_rows(&["?t WHERE"], vec![row([("t", PERSON)])])
            .with_rows(&["COUNT"], vec![row([("card", count)])])
    }

    #[tokio::test]
    async fn first_registered_source_is_the_merge_receiver() {
        let mut config = DiscoveryConfig::structure_only();
        config.collect_stats = true;
        // a answers last but is folded first
        let router = MockRouter::new()
            .with_route("http://a/sparql", Arc::new(counted_endpoint("10").with_latency(Duration::from_millis(50))))
            .with_route("http://b/sparql", Arc::new(counted_endpoint("20")));
        let extractor = FederationExtractor::new(Arc::new(SchemaDiscoverer::new(Arc::new(router), config)))
            .with_max_concurrent_sources(2);
        let federation = Federation::new("test");
        federation.add_source(DataSource::sparql("b", "http://b/sparql"));
        federation.add_source(DataSource::sparql("a", "http://a/sparql"));

        extractor.extract_molecules(&federation, ExtractMode::Merge).await;

        let person = federation.get_rdfmt(PERSON).unwrap();
        assert_eq!(person.cardinality, 10);
        assert_eq!(person.sources[0].id, "a");
    }

    #[tokio::test]
    async fn unreachable_source_is_counted_as_failed() {
        let router = MockRouter::new()
            .with_route("http://a/sparql", Arc::new(MockTransport::new().with_rejection(&["SELECT"])))
            .with_route("http://b/sparql", endpoint(&[PLACE], &[]));
        let extractor =
            FederationExtractor::new(Arc::new(SchemaDiscoverer::new(Arc::new(router), DiscoveryConfig::structure_only())));
        let federation = Federation::new("test");
        federation.add_source(DataSource::sparql("a", "http://a/sparql"));
        federation.add_source(DataSource::sparql("b", "http://b/sparql"));

        let report = extractor.extract_molecules(&federation, ExtractMode::Merge).await;

        assert_eq!(report.sources_failed, 1);
        assert_eq!(report.sources_discovered, 1);
        assert!(!report.is_clean());
        assert_eq!(federation.rdfmt_ids(), vec![PLACE.to_string()]);
    }
}
