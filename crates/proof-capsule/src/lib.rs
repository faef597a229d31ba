//! Construction of the immutable forensic capsule and the proof-input
//! manifest it can carry inline.
//!
//! Event sequence (high-level): capsule.build → capsule.hash →
//! manifest.build → manifest.sign (optional)

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod builder;
mod manifest;

pub use builder::{CapsuleBuilder, CapsuleError};
pub use manifest::{ManifestError, ProofInputManifest};

use proof_canon::{canonize, sha256_hex, CanonError};
use proof_types::ForensicCapsule;

/// Returns `capsule` with any `sha256:` ascii prefix stripped from
/// `output_hash`. The prefix is permitted on the field for display purposes,
/// but canonical bytes always carry the raw hex (§4.6 of the capsule spec).
fn normalized(capsule: &ForensicCapsule) -> std::borrow::Cow<'_, ForensicCapsule> {
    match capsule.output_hash.strip_prefix("sha256:") {
        Some(raw) => {
            let mut owned = capsule.clone();
            owned.output_hash = raw.to_string();
            std::borrow::Cow::Owned(owned)
        }
        None => std::borrow::Cow::Borrowed(capsule),
    }
}

/// Computes the capsule's canonical bytes, with any `sha256:` prefix on
/// `output_hash` normalized away first. This is what both [`capsule_hash`]
/// and the bundle assembler must write/hash, so the two never disagree.
///
/// # Errors
///
/// Returns `CanonError` if the capsule cannot be canonicalized.
pub fn canonical_bytes(capsule: &ForensicCapsule) -> Result<Vec<u8>, CanonError> {
    canonize(normalized(capsule).as_ref())
}

/// Computes the capsule hash: `SHA-256` of the capsule's canonical bytes,
/// rendered lower-case hex. This is the stable identifier the ledger binds
/// to, per the capsule's immutability invariant.
///
/// # Errors
///
/// Returns `CanonError` if the capsule cannot be canonicalized (it never
/// should, since `ForensicCapsule` fields are all integers, strings, and
/// plain JSON values).
pub fn capsule_hash(capsule: &ForensicCapsule) -> Result<String, CanonError> {
    Ok(sha256_hex(&canonical_bytes(capsule)?))
}
