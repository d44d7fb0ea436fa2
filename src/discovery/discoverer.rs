//! Schema discovery for a single SPARQL endpoint
//!
//! Enumerates concepts, their predicates and the ranges of each predicate,
//! optionally resolving labels and cardinalities, and assembles the result
//! into molecule templates.

use super::config::{DiscoveryConfig, DiscoveryOptions};
use super::paginator::{PageStatus, Paginator};
use super::queries;
use super::rows::{
    ConceptRow, CountRow, InstanceRow, LabelRow, PredicateRow, RangeRow, SuperClassRow,
};
use crate::model::{DataSource, Predicate, Rdfmt, TemplateType};
use crate::transport::SparqlTransport;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A concept found on an endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptRecord {
    pub uri: String,
    /// Resolved label; the URI itself when none was found
    pub label: Option<String>,
    /// Distinct typed subjects, `-1` when the source returned nothing
    pub cardinality: Option<i64>,
    /// Superclass closure, denylist-filtered
    pub sub_class_of: Vec<String>,
}

/// A predicate used by instances of a concept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateRecord {
    pub uri: String,
    pub label: Option<String>,
    pub cardinality: Option<i64>,
}

/// Templates found on one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDiscovery {
    pub templates: Vec<Rdfmt>,
    /// `Failed` when the source never completed the concept enumeration
    pub status: PageStatus,
}

impl SourceDiscovery {
    pub fn is_failed(&self) -> bool {
        self.status == PageStatus::Failed
    }
}

/// Discovers the implicit schema of SPARQL endpoints
pub struct SchemaDiscoverer {
    transport: Arc<dyn SparqlTransport>,
    config: DiscoveryConfig,
}

impl SchemaDiscoverer {
    pub fn new(transport: Arc<dyn SparqlTransport>, config: DiscoveryConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    fn paginator<'a>(&'a self, endpoint: &'a str) -> Paginator<'a> {
        Paginator::new(self.transport.as_ref(), endpoint)
    }

    fn labeling_predicate<'a>(&'a self, options: &'a DiscoveryOptions) -> &'a str {
        options
            .labeling_predicate
            .as_deref()
            .unwrap_or(&self.config.labeling_predicate)
    }

    /// Enumerate the domain concepts of an endpoint
    pub async fn discover_concepts(
        &self,
        endpoint: &str,
        options: &DiscoveryOptions,
    ) -> Vec<ConceptRecord> {
        self.enumerate_concepts(endpoint, options).await.0
    }

    async fn enumerate_concepts(
        &self,
        endpoint: &str,
        options: &DiscoveryOptions,
    ) -> (Vec<ConceptRecord>, PageStatus) {
        let paginator = self.paginator(endpoint);
        let page_size = options.limit.unwrap_or(self.config.page_sizes.concepts);
        let result = paginator
            .fetch_all(&queries::concepts(&options.typing_predicate), page_size)
            .await;
        if result.is_failed() {
            warn!(endpoint, "concept enumeration incomplete");
        }

        let uris = distinct(
            result
                .rows
                .iter()
                .filter_map(ConceptRow::from_row)
                .map(|c| c.uri)
                .filter(|uri| !self.config.denylist.excludes(uri)),
        );
        debug!(endpoint, concepts = uris.len(), "concepts enumerated");

        let labels = if options.collect_labels {
            Some(
                self.resolve_labels(
                    endpoint,
                    &uris,
                    self.labeling_predicate(options),
                    self.config.page_sizes.concept_labels,
                )
                .await,
            )
        } else {
            None
        };

        let mut records = Vec::with_capacity(uris.len());
        for (i, uri) in uris.into_iter().enumerate() {
            let cardinality = if options.collect_stats {
                let query = queries::concept_cardinality(&options.typing_predicate, &uri);
                Some(self.count(endpoint, &query).await)
            } else {
                None
            };
            let sub_class_of = self.super_classes(endpoint, &uri).await;

            records.push(ConceptRecord {
                label: labels.as_ref().map(|l| l[i].clone()),
                uri,
                cardinality,
                sub_class_of,
            });
        }
        (records, result.status)
    }

    /// Enumerate the predicates used by instances of `concept`
    ///
    /// Falls back to sampling instances when the endpoint cannot answer the
    /// direct enumeration.
    pub async fn discover_predicates(
        &self,
        endpoint: &str,
        concept: &str,
        options: &DiscoveryOptions,
    ) -> Vec<PredicateRecord> {
        let paginator = self.paginator(endpoint);
        let page_size = options.limit.unwrap_or(self.config.page_sizes.predicates);
        let result = paginator
            .fetch_all(&queries::predicates(&options.typing_predicate, concept), page_size)
            .await;

        let mut found: Vec<String> = result
            .rows
            .iter()
            .filter_map(PredicateRow::from_row)
            .map(|p| p.uri)
            .collect();

        if result.is_failed() {
            warn!(endpoint, concept, "predicate enumeration failed, sampling instances");
            found.extend(
                self.sample_predicates(endpoint, &options.typing_predicate, concept)
                    .await,
            );
        }
        let uris = distinct(found);

        let labels = if options.collect_labels {
            Some(
                self.resolve_labels(
                    endpoint,
                    &uris,
                    self.labeling_predicate(options),
                    self.config.page_sizes.predicate_labels,
                )
                .await,
            )
        } else {
            None
        };

        let mut records = Vec::with_capacity(uris.len());
        for (i, uri) in uris.into_iter().enumerate() {
            let cardinality = if options.collect_stats {
                let query = queries::predicate_cardinality(&options.typing_predicate, concept, &uri);
                Some(self.count(endpoint, &query).await)
            } else {
                None
            };
            records.push(PredicateRecord {
                label: labels.as_ref().map(|l| l[i].clone()),
                uri,
                cardinality,
            });
        }
        records
    }

    /// Declared and observed range types of `predicate` on `concept`
    pub async fn discover_predicate_ranges(
        &self,
        endpoint: &str,
        concept: &str,
        predicate: &str,
        options: &DiscoveryOptions,
    ) -> BTreeSet<String> {
        let paginator = self.paginator(endpoint);
        let page_size = self.config.page_sizes.ranges;
        let typing = &options.typing_predicate;

        let declared = paginator
            .fetch_all(&queries::declared_ranges(predicate), page_size)
            .await;
        let typed = paginator
            .fetch_all(&queries::instance_ranges(typing, concept, predicate), page_size)
            .await;
        let datatypes = paginator
            .fetch_all(&queries::datatype_ranges(typing, concept, predicate), page_size)
            .await;

        declared
            .rows
            .iter()
            .filter_map(|r| RangeRow::from_row(r, "range"))
            .chain(typed.rows.iter().filter_map(|r| RangeRow::from_row(r, "r")))
            .chain(datatypes.rows.iter().filter_map(|r| RangeRow::from_row(r, "r")))
            .map(|r| r.uri)
            .filter(|uri| !self.config.denylist.excludes(uri))
            .collect()
    }

    /// Discover every concept of a source as fully populated templates
    pub async fn discover_source(&self, source: &DataSource) -> SourceDiscovery {
        self.discover_source_with(source, &self.config.options()).await
    }

    /// Discover a source with explicit options
    ///
    /// Sources that are not SPARQL endpoints are not introspected and yield
    /// no templates. Concepts collected before a failed enumeration are
    /// still described.
    pub async fn discover_source_with(
        &self,
        source: &DataSource,
        options: &DiscoveryOptions,
    ) -> SourceDiscovery {
        if !source.kind.is_queryable() {
            info!(source = %source.id, kind = %source.kind, "source kind not introspected, skipping");
            return SourceDiscovery {
                templates: Vec::new(),
                status: PageStatus::Complete,
            };
        }

        let endpoint = source.url.as_str();
        let (concepts, status) = self.enumerate_concepts(endpoint, options).await;
        info!(source = %source.id, concepts = concepts.len(), "discovering predicates");

        let mut templates = Vec::with_capacity(concepts.len());
        for concept in concepts {
            let mut template = Rdfmt::new(concept.uri.clone())
                .with_type(TemplateType::Typed)
                .with_super_classes(concept.sub_class_of);
            if let Some(label) = concept.label {
                template.label = label;
            }
            if let Some(cardinality) = concept.cardinality {
                template.cardinality = cardinality;
            }

            for record in self.discover_predicates(endpoint, &concept.uri, options).await {
                let ranges = self
                    .discover_predicate_ranges(endpoint, &concept.uri, &record.uri, options)
                    .await;
                let mut predicate = Predicate::new(record.uri).with_ranges(ranges);
                if let Some(label) = record.label {
                    predicate.label = label;
                }
                if let Some(cardinality) = record.cardinality {
                    predicate.cardinality = cardinality;
                }
                template.add_predicate(predicate);
            }

            template.add_source(source.clone());
            templates.push(template);
        }

        if status == PageStatus::Failed {
            warn!(source = %source.id, templates = templates.len(), "source discovered partially");
        } else {
            info!(source = %source.id, templates = templates.len(), "source discovered");
        }
        SourceDiscovery { templates, status }
    }

    /// Predicates of a sample of instances, queried a few instances at a time
    async fn sample_predicates(&self, endpoint: &str, typing: &str, concept: &str) -> Vec<String> {
        let paginator = self.paginator(endpoint);
        let sampling = &self.config.sampling;

        let sample = paginator
            .fetch(
                &queries::instances(typing, concept),
                sampling.page_size,
                Some(sampling.max_instances),
            )
            .await;
        let instances: Vec<String> = sample
            .rows
            .iter()
            .filter_map(InstanceRow::from_row)
            .filter(InstanceRow::is_addressable)
            .map(|i| i.uri)
            .collect();
        debug!(endpoint, concept, instances = instances.len(), "sampled instances");

        let mut predicates = Vec::new();
        for batch in instances.chunks(sampling.batch_size.max(1)) {
            let result = paginator
                .fetch_all(
                    &queries::predicates_of_instances(batch),
                    self.config.page_sizes.sampled_predicates,
                )
                .await;
            predicates.extend(
                result
                    .rows
                    .iter()
                    .filter_map(PredicateRow::from_row)
                    .map(|p| p.uri),
            );
        }
        distinct(predicates)
    }

    /// Labels for `ids`, in order; an id without a label is its own label
    async fn resolve_labels(
        &self,
        endpoint: &str,
        ids: &[String],
        labeling: &str,
        page_size: usize,
    ) -> Vec<String> {
        let paginator = self.paginator(endpoint);
        let language = &self.config.label_language;
        let mut labels: Vec<String> = ids.to_vec();

        let batch_size = self.config.label_batch_size.max(1);
        for (batch_index, batch) in ids.chunks(batch_size).enumerate() {
            let query = queries::labels(batch, labeling, language);
            let result = paginator.fetch_all(&query, page_size).await;
            for row in &result.rows {
                for (member, label) in LabelRow::from_row(row, batch.len(), language).labels {
                    labels[batch_index * batch_size + member] = label;
                }
            }
        }
        labels
    }

    async fn count(&self, endpoint: &str, query: &str) -> i64 {
        let result = self
            .paginator(endpoint)
            .fetch_all(query, self.config.page_sizes.cardinality)
            .await;
        CountRow::first_or_unknown(&result.rows)
    }

    async fn super_classes(&self, endpoint: &str, concept: &str) -> Vec<String> {
        let result = self
            .paginator(endpoint)
            .fetch_all(&queries::super_classes(concept), self.config.page_sizes.super_classes)
            .await;
        distinct(
            result
                .rows
                .iter()
                .filter_map(SuperClassRow::from_row)
                .map(|sc| sc.uri)
                .filter(|uri| !self.config.denylist.excludes(uri)),
        )
    }
}

/// Deduplicate, keeping first occurrences in order
fn distinct<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
