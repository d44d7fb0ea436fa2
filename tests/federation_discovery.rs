//! End-to-end extraction over mocked endpoints
//!
//! Run with: `cargo test --test federation_discovery`

mod common;

use common::{extractor_for, EndpointFixture, LANG_STRING, XSD_INT, XSD_INTEGER, XSD_STRING};
use rdfmt::{DataSource, ExtractMode, Federation};

const PERSON: &str = "http://xmlns.com/foaf/0.1/Person";
const PLACE: &str = "http://schema.org/Place";
const DRUG: &str = "http://bio2rdf.org/drugbank_vocabulary:Drug";
const NAME: &str = "http://xmlns.com/foaf/0.1/name";
const AGE: &str = "http://xmlns.com/foaf/0.1/age";
const GEO: &str = "http://schema.org/geo";

const A_URL: &str = "http://a.example/sparql";
const B_URL: &str = "http://b.example/sparql";

fn people() -> EndpointFixture {
    EndpointFixture::new().concept(PERSON, 10, &[(NAME, XSD_STRING, 10), (AGE, XSD_INT, 7)])
}

fn places() -> EndpointFixture {
    EndpointFixture::new()
        .concept(PERSON, 20, &[(NAME, LANG_STRING, 18), (AGE, XSD_INTEGER, 15)])
        .concept(PLACE, 5, &[(GEO, XSD_STRING, 5)])
}

fn federation() -> (Federation, DataSource, DataSource) {
    let a = DataSource::sparql("a", A_URL);
    let b = DataSource::sparql("b", B_URL);
    let federation = Federation::with_id("fed", "people and places");
    federation.add_source(a.clone());
    federation.add_source(b.clone());
    (federation, a, b)
}

#[tokio::test]
async fn shared_concepts_merge_across_sources() {
    let (federation, a, b) = federation();
    let extractor = extractor_for(&[(A_URL, &people()), (B_URL, &places())]);

    let report = extractor.extract_molecules(&federation, ExtractMode::Merge).await;

    assert_eq!(report.sources_discovered, 2);
    assert_eq!(report.templates_folded, 3);
    assert_eq!(federation.rdfmt_ids(), vec![PLACE.to_string(), PERSON.to_string()]);

    let person = federation.get_rdfmt(PERSON).unwrap();
    assert!(person.has_source(&a) && person.has_source(&b));
    assert_eq!(person.predicate_count(), 2);
    // a is registered first, so its known values win
    assert_eq!(person.cardinality, 10);

    // rdf:langString sits in a denylisted namespace
    let name = person.predicate(NAME).unwrap();
    assert_eq!(name.ranges.iter().collect::<Vec<_>>(), vec![XSD_STRING]);

    let age = person.predicate(AGE).unwrap();
    assert_eq!(age.cardinality, 7);
    assert!(age.ranges.contains(XSD_INT) && age.ranges.contains(XSD_INTEGER));

    let place = federation.get_rdfmt(PLACE).unwrap();
    assert!(place.is_sole_source(&b));
    assert_eq!(place.cardinality, 5);
}

#[tokio::test]
async fn merge_extraction_is_idempotent() {
    let (federation, _, _) = federation();
    let extractor = extractor_for(&[(A_URL, &people()), (B_URL, &places())]);

    extractor.extract_molecules(&federation, ExtractMode::Merge).await;
    let once = federation.rdfmts();
    extractor.extract_molecules(&federation, ExtractMode::Merge).await;

    let twice = federation.rdfmts();
    assert_eq!(once.len(), twice.len());
    for (first, second) in once.iter().zip(&twice) {
        assert_eq!(first.id, second.id);
        assert_eq!(first.predicates.keys().collect::<Vec<_>>(), second.predicates.keys().collect::<Vec<_>>());
        assert_eq!(first.sources, second.sources);
    }
}

#[tokio::test]
async fn oversized_concept_pages_are_shrunk() {
    let mut fixture = EndpointFixture::new();
    for i in 0..30 {
        fixture = fixture.concept(&format!("http://large.example/C{}", i), 1, &[]);
    }
    let fixture = fixture.with_concept_page_cap(20);
    let federation = Federation::new("large");
    federation.add_source(DataSource::sparql("large", A_URL));

    let report = extractor_for(&[(A_URL, &fixture)])
        .extract_molecules(&federation, ExtractMode::Merge)
        .await;

    assert_eq!(report.templates_folded, 30);
    assert_eq!(federation.rdfmt_count(), 30);
}

#[tokio::test]
async fn unreachable_source_does_not_block_the_rest() {
    let (federation, _, b) = federation();
    let extractor = extractor_for(&[(A_URL, &EndpointFixture::new().unreachable()), (B_URL, &places())]);

    let report = extractor.extract_molecules(&federation, ExtractMode::Merge).await;

    assert_eq!(report.sources_failed, 1);
    assert_eq!(report.sources_discovered, 1);
    assert!(!report.is_clean());
    assert_eq!(federation.rdfmt_count(), 2);
    assert!(federation.rdfmts().iter().all(|mt| mt.is_sole_source(&b)));
}

#[tokio::test]
async fn refreshing_a_source_picks_up_schema_changes() {
    let (federation, a, b) = federation();
    extractor_for(&[(A_URL, &people()), (B_URL, &places())])
        .extract_molecules(&federation, ExtractMode::Merge)
        .await;

    // b no longer exposes places
    let shrunk = EndpointFixture::new().concept(PERSON, 20, &[(NAME, LANG_STRING, 18)]);
    let report = extractor_for(&[(A_URL, &people()), (B_URL, &shrunk)])
        .extract_source_molecules(&federation, &b)
        .await
        .unwrap();

    assert_eq!(report.templates_folded, 1);
    assert!(federation.get_rdfmt(PLACE).is_none());
    let person = federation.get_rdfmt(PERSON).unwrap();
    assert!(person.has_source(&a) && person.has_source(&b));
    assert_eq!(federation.rdfmts_from_source(&b).len(), 1);
}

#[tokio::test]
async fn snapshot_file_restores_the_federation() {
    let (federation, a, _) = federation();
    extractor_for(&[(A_URL, &people()), (B_URL, &places())])
        .extract_molecules(&federation, ExtractMode::Merge)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fed.json");
    std::fs::write(&path, federation.to_json_string().unwrap()).unwrap();

    let restored = Federation::from_json_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(restored.id(), "fed");
    assert_eq!(restored.source_count(), 2);
    assert_eq!(restored.rdfmts(), federation.rdfmts());
    assert_eq!(restored.get_source("a"), Some(a));

    // the restored registry keeps merging
    let report = extractor_for(&[(A_URL, &EndpointFixture::new().concept(DRUG, 3, &[])), (B_URL, &places())])
        .extract_molecules(&restored, ExtractMode::Merge)
        .await;
    assert_eq!(report.sources_discovered, 2);
    assert_eq!(restored.rdfmt_count(), 3);
    assert!(restored.get_rdfmt(PERSON).unwrap().predicate(AGE).is_some());
}
