#![forbid(unsafe_code)]
#![deny(missing_docs)]
//! Temporal gating of a context sequence, and a Merkle root over the
//! surviving items.
//!
//! Event sequence (high-level, mirrors the wider pipeline's audit trail):
//! context.received → policy.gate → context.attested

use proof_canon::{canonize, sha256, CanonError};
use proof_types::{ContextItem, GatedContext};
use thiserror::Error;

/// Errors raised while gating or attesting a context set.
#[derive(Debug, Error)]
pub enum ContextError {
    /// An item's canonical bytes could not be produced.
    #[error("canonicalization failed: {0}")]
    Canon(#[from] CanonError),
}

/// Filters `items` by `t_target` according to `policy_id`.
///
/// - `"strict"` keeps only items with `timestamp <= t_target`.
/// - `"none"` or any other value keeps all items.
///
/// `has_post_target` is set whenever any *input* item exceeded the
/// boundary, independent of whether that item survived filtering.
/// Input order and items themselves are never mutated.
#[must_use]
pub fn gate(items: &[ContextItem], t_target: i64, policy_id: &str) -> GatedContext {
    let has_post_target = items.iter().any(|i| i.timestamp > t_target);
    let kept = match policy_id {
        "strict" => items
            .iter()
            .filter(|i| i.timestamp <= t_target)
            .cloned()
            .collect(),
        _ => items.to_vec(),
    };
    GatedContext {
        items: kept,
        policy_id: policy_id.to_string(),
        boundary: t_target,
        has_post_target,
    }
}

/// Computes the Merkle root over a sequence of context items, in order.
///
/// Each leaf is the SHA-256 of the item's canonical bytes. Adjacent digests
/// are combined pairwise, left to right; an odd digest out at any level is
/// duplicated before pairing. An empty sequence yields `SHA-256("")`.
///
/// # Errors
///
/// Returns `ContextError::Canon` if an item fails to canonicalize.
pub fn merkle_root(items: &[ContextItem]) -> Result<[u8; 32], ContextError> {
    if items.is_empty() {
        return Ok(sha256(b""));
    }
    let mut level: Vec<[u8; 32]> = items
        .iter()
        .map(|item| Ok(sha256(&canonize(item)?)))
        .collect::<Result<_, ContextError>>()?;
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            level.push(*level.last().unwrap());
        }
        level = level
            .chunks_exact(2)
            .map(|pair| {
                let mut combined = Vec::with_capacity(64);
                combined.extend_from_slice(&pair[0]);
                combined.extend_from_slice(&pair[1]);
                sha256(&combined)
            })
            .collect();
    }
    Ok(level[0])
}

/// Computes the Merkle root and renders it as lower-case hex.
///
/// # Errors
///
/// Returns `ContextError::Canon` if an item fails to canonicalize.
pub fn merkle_root_hex(items: &[ContextItem]) -> Result<String, ContextError> {
    Ok(hex::encode(merkle_root(items)?))
}
