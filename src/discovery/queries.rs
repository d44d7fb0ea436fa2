//! SPARQL text for each discovery query
//!
//! Identifiers are spliced in verbatim between angle brackets; callers must
//! not pass URIs containing `<`, `>` or whitespace.

use super::config::{RDFS_RANGE, RDFS_SUBCLASS_OF};

/// Render a relation as a query term: `a` stays bare, URIs get brackets
pub fn term(relation: &str) -> String {
    if relation == "a" || relation.starts_with('<') {
        relation.to_string()
    } else {
        format!("<{}>", relation)
    }
}

pub fn concepts(typing: &str) -> String {
    format!("SELECT DISTINCT ?t WHERE {{ ?s {} ?t }}", term(typing))
}

pub fn super_classes(concept: &str) -> String {
    format!(
        "SELECT DISTINCT ?sc WHERE {{ <{}> <{}>* ?sc }}",
        concept, RDFS_SUBCLASS_OF
    )
}

pub fn concept_cardinality(typing: &str, concept: &str) -> String {
    format!(
        "SELECT (COUNT(DISTINCT ?s) AS ?card) WHERE {{ ?s {} <{}> }}",
        term(typing),
        concept
    )
}

pub fn predicates(typing: &str, concept: &str) -> String {
    format!(
        "SELECT DISTINCT ?p WHERE {{ ?s {} <{}> . ?s ?p ?pt . }}",
        term(typing),
        concept
    )
}

pub fn predicate_cardinality(typing: &str, concept: &str, predicate: &str) -> String {
    format!(
        "SELECT (COUNT(DISTINCT ?s) AS ?card) WHERE {{ ?s {} <{}> . ?s <{}> ?o . }}",
        term(typing),
        concept,
        predicate
    )
}

pub fn instances(typing: &str, concept: &str) -> String {
    format!("SELECT DISTINCT ?s WHERE {{ ?s {} <{}> . }}", term(typing), concept)
}

/// Union of predicates used by any of `instances`
pub fn predicates_of_instances(instances: &[String]) -> String {
    let branches: Vec<String> = instances
        .iter()
        .map(|i| format!("{{ <{}> ?p ?pt }}", i))
        .collect();
    format!("SELECT DISTINCT ?p WHERE {{ {} }}", branches.join(" UNION "))
}

pub fn declared_ranges(predicate: &str) -> String {
    format!(
        "SELECT DISTINCT ?range WHERE {{ <{}> <{}> ?range . }}",
        predicate, RDFS_RANGE
    )
}

pub fn instance_ranges(typing: &str, concept: &str, predicate: &str) -> String {
    format!(
        "SELECT DISTINCT ?r WHERE {{ ?s {} <{}> . ?s <{}> ?pt . ?pt {} ?r . }}",
        term(typing),
        concept,
        predicate,
        term(typing)
    )
}

pub fn datatype_ranges(typing: &str, concept: &str, predicate: &str) -> String {
    format!(
        "SELECT DISTINCT (DATATYPE(?pt) AS ?r) WHERE {{ ?s {} <{}> . ?s <{}> ?pt . }}",
        term(typing),
        concept,
        predicate
    )
}

/// One round trip for a batch of labels: member `i` binds `?l{i}`
pub fn labels(ids: &[String], labeling: &str, language: &str) -> String {
    let branches: Vec<String> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            format!(
                "{{ <{}> {} ?l{} . FILTER (LCASE(LANG(?l{})) = '{}') }}",
                id,
                term(labeling),
                i,
                i,
                language.to_lowercase()
            )
        })
        .collect();
    format!("SELECT DISTINCT * WHERE {{ {} }}", branches.join(" UNION "))
}
