//! Typed views over transport rows, one per query shape
//!
//! Rows come off the transport as string maps. Each discovery query converts
//! them right away, dropping rows that lack the variable the query binds.

use crate::model::UNKNOWN_CARDINALITY;
use crate::transport::Row;

/// A concept bound to `?t`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptRow {
    pub uri: String,
}

impl ConceptRow {
    pub fn from_row(row: &Row) -> Option<Self> {
        non_empty(row, "t").map(|uri| Self { uri })
    }
}

/// A predicate bound to `?p`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateRow {
    pub uri: String,
}

impl PredicateRow {
    pub fn from_row(row: &Row) -> Option<Self> {
        non_empty(row, "p").map(|uri| Self { uri })
    }
}

/// A range type bound to the given variable (`?range` or `?r`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRow {
    pub uri: String,
}

impl RangeRow {
    pub fn from_row(row: &Row, var: &str) -> Option<Self> {
        non_empty(row, var).map(|uri| Self { uri })
    }
}

/// A superclass bound to `?sc`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperClassRow {
    pub uri: String,
}

impl SuperClassRow {
    pub fn from_row(row: &Row) -> Option<Self> {
        non_empty(row, "sc").map(|uri| Self { uri })
    }
}

/// A sampled instance bound to `?s`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRow {
    pub uri: String,
}

impl InstanceRow {
    pub fn from_row(row: &Row) -> Option<Self> {
        non_empty(row, "s").map(|uri| Self { uri })
    }

    /// Blank nodes cannot be named in a follow-up query
    pub fn is_addressable(&self) -> bool {
        !self.uri.starts_with("_:") && !self.uri.starts_with("nodeID://")
    }
}

/// A count bound to `?card`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountRow {
    pub count: i64,
}

impl CountRow {
    pub fn from_row(row: &Row) -> Option<Self> {
        row.get("card").and_then(|v| parse_count(v)).map(|count| Self { count })
    }

    /// Count from the first row, or unknown when there is none
    pub fn first_or_unknown(rows: &[Row]) -> i64 {
        rows.first()
            .and_then(Self::from_row)
            .map(|r| r.count)
            .unwrap_or(UNKNOWN_CARDINALITY)
    }
}

/// One row of a combined label query: `?l0`, `?l1`, ... per batch member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRow {
    /// `(batch index, label)` for each member bound in this row
    pub labels: Vec<(usize, String)>,
}

impl LabelRow {
    pub fn from_row(row: &Row, batch_len: usize, language: &str) -> Self {
        let labels = (0..batch_len)
            .filter_map(|i| {
                non_empty(row, &format!("l{}", i)).map(|label| (i, strip_language(&label, language)))
            })
            .collect();
        Self { labels }
    }
}

fn non_empty(row: &Row, var: &str) -> Option<String> {
    row.get(var).filter(|v| !v.is_empty()).cloned()
}

/// Leading integer of a rendered literal such as `42^^<xsd:integer>`
fn parse_count(value: &str) -> Option<i64> {
    let digits: String = value
        .trim()
        .chars()
        .enumerate()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && *c == '-'))
        .map(|(_, c)| c)
        .collect();
    digits.parse().ok()
}

/// Drop a trailing `@lang` tag that matches `language`
fn strip_language(label: &str, language: &str) -> String {
    let suffix = format!("@{}", language);
    match label.len().checked_sub(suffix.len()) {
        Some(cut) if label.is_char_boundary(cut) && label[cut..].eq_ignore_ascii_case(&suffix) => {
            label[..cut].to_string()
        }
        _ => label.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::row;

    #[test]
    fn rows_without_binding_are_dropped() {
        assert_eq!(ConceptRow::from_row(&row([("t", "")])), None);
        assert_eq!(PredicateRow::from_row(&row([("x", "p")])), None);
        assert_eq!(
            RangeRow::from_row(&row([("r", "http://www.w3.org/2001/XMLSchema#int")]), "r"),
            Some(RangeRow {
                uri: "http://www.w3.org/2001/XMLSchema#int".into()
            })
        );
    }

    #[test]
    fn counts_parse_typed_literals() {
        let rows = vec![row([("card", "42^^<http://www.w3.org/2001/XMLSchema#integer>")])];
        assert_eq!(CountRow::first_or_unknown(&rows), 42);
        assert_eq!(CountRow::first_or_unknown(&[row([("card", "7")])]), 7);
        assert_eq!(CountRow::first_or_unknown(&[]), UNKNOWN_CARDINALITY);
        assert_eq!(CountRow::first_or_unknown(&[row([("card", "n/a")])]), UNKNOWN_CARDINALITY);
    }

    #[test]
    fn label_rows_pick_bound_members_and_strip_language() {
        let r = row([("l0", "Person@en"), ("l2", "Place@EN"), ("l1", "")]);
        let labels = LabelRow::from_row(&r, 3, "en").labels;

        assert_eq!(labels.len(), 2);
        assert!(labels.contains(&(0, "Person".to_string())));
        assert!(labels.contains(&(2, "Place".to_string())));
    }

    #[test]
    fn other_language_tags_are_kept() {
        assert_eq!(strip_language("Personne@fr", "en"), "Personne@fr");
        assert_eq!(strip_language("en", "en"), "en");
    }

    #[test]
    fn blank_node_instances_are_not_addressable() {
        assert!(!InstanceRow { uri: "_:b0".into() }.is_addressable());
        assert!(!InstanceRow { uri: "nodeID://b1".into() }.is_addressable());
        assert!(InstanceRow { uri: "http://e.org/x".into() }.is_addressable());
    }
}
