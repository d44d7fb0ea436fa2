//! Field-level merge policy shared by predicates and molecule templates
//!
//! The receiver of a merge is authoritative: its populated fields always win,
//! and the other side only fills in what the receiver left empty or unknown.

use thiserror::Error;

/// Cardinality value meaning "not collected"
pub const UNKNOWN_CARDINALITY: i64 = -1;

/// Errors raised when merging schema descriptions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// Two descriptions with different identities were merged
    #[error("cannot merge {kind} {receiver} with {other}: identities differ")]
    IdentityMismatch {
        kind: &'static str,
        receiver: String,
        other: String,
    },
}

pub(crate) fn check_identity(kind: &'static str, receiver: &str, other: &str) -> Result<(), MergeError> {
    if receiver == other {
        Ok(())
    } else {
        Err(MergeError::IdentityMismatch {
            kind,
            receiver: receiver.to_string(),
            other: other.to_string(),
        })
    }
}

pub(crate) fn prefer_text(receiver: &str, other: &str) -> String {
    if receiver.is_empty() {
        other.to_string()
    } else {
        receiver.to_string()
    }
}

pub(crate) fn prefer_cardinality(receiver: i64, other: i64) -> i64 {
    if receiver == UNKNOWN_CARDINALITY {
        other
    } else {
        receiver
    }
}

/// Order-preserving union: receiver's entries first, then unseen entries of `other`
pub(crate) fn union_ordered<T: PartialEq + Clone>(receiver: &[T], other: &[T]) -> Vec<T> {
    let mut merged: Vec<T> = Vec::with_capacity(receiver.len() + other.len());
    for item in receiver.iter().chain(other) {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}
