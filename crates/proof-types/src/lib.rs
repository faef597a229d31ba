#![forbid(unsafe_code)]
#![deny(missing_docs)]
//! Shared record types for the proof pipeline: context items, the forensic
//! capsule, the proof-input manifest, and the small hex-encoded digest and
//! key newtypes they all build on.

use core::fmt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors raised by the newtypes in this crate.
#[derive(Debug, Error)]
pub enum TypesError {
    /// A hex string did not decode.
    #[error("hex decode error")]
    Hex,
    /// A decoded value had the wrong length.
    #[error("length mismatch: expected {expected}, got {actual}")]
    Length {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },
}

/// A 32-byte digest (SHA-256 output), serialized as 64 lower-case hex chars.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Digest32(pub [u8; 32]);

impl Digest32 {
    /// Builds a digest from a hex string.
    ///
    /// # Errors
    ///
    /// Returns `TypesError::Hex` if decoding fails or `TypesError::Length` if
    /// the decoded value is not 32 bytes.
    pub fn from_hex(s: &str) -> Result<Self, TypesError> {
        let bytes = hex::decode(s).map_err(|_| TypesError::Hex)?;
        if bytes.len() != 32 {
            return Err(TypesError::Length {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }

    /// Lower-case hex representation.
    #[must_use]
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Digest32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest32({})", hex::encode(self.0))
    }
}
impl fmt::Display for Digest32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
impl Serialize for Digest32 {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(self.0))
    }
}
impl<'de> Deserialize<'de> for Digest32 {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = <&str>::deserialize(d)?;
        Self::from_hex(s).map_err(serde::de::Error::custom)
    }
}

/// A 32-byte Ed25519 public key, serialized as lower-case hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKeyBytes(pub [u8; 32]);

impl fmt::Debug for PublicKeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKeyBytes({})", hex::encode(self.0))
    }
}
impl Serialize for PublicKeyBytes {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(self.0))
    }
}
impl<'de> Deserialize<'de> for PublicKeyBytes {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = <&str>::deserialize(d)?;
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        if bytes.len() != 32 {
            return Err(serde::de::Error::custom("PublicKeyBytes must be 32 bytes"));
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

/// A 64-byte Ed25519 signature, serialized as lower-case hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureBytes(pub [u8; 64]);

impl fmt::Debug for SignatureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureBytes({}..)", &hex::encode(self.0)[..16])
    }
}
impl Serialize for SignatureBytes {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(self.0))
    }
}
impl<'de> Deserialize<'de> for SignatureBytes {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = <&str>::deserialize(d)?;
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        if bytes.len() != 64 {
            return Err(serde::de::Error::custom("SignatureBytes must be 64 bytes"));
        }
        let mut out = [0u8; 64];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

/// One document that was available to a generator at attestation time.
///
/// All four fields are required (§3 of the proof-bundle data model); the
/// `content_hash` is the lower-case hex SHA-256 of that document's bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextItem {
    /// Caller-assigned identifier for the document.
    pub doc_id: String,
    /// Lower-case hex SHA-256 of the document's bytes.
    pub content_hash: Digest32,
    /// Unix seconds at which the document became available.
    pub timestamp: i64,
    /// Identifier of the document's source (a tool, a URL, a corpus name...).
    pub source_id: String,
}

/// The subset of context items retained after temporal filtering, plus the
/// policy that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatedContext {
    /// Items kept after filtering, in their original relative order.
    pub items: Vec<ContextItem>,
    /// Identifier of the policy that was applied (`"strict"`, `"none"`, ...).
    pub policy_id: String,
    /// The temporal boundary the gate compared against.
    pub boundary: i64,
    /// True iff some *input* item had `timestamp > boundary`, regardless of
    /// whether that item survived filtering.
    pub has_post_target: bool,
}

/// The immutable attestation record for one artifact at one moment.
///
/// Optional fields are omitted from the canonical encoding when `None`
/// (proof-canon's null-omission rule); this struct is never mutated once
/// built.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForensicCapsule {
    /// When the capsule was built (Unix seconds).
    pub t_run: i64,
    /// The declared temporal boundary for this attestation.
    pub t_target: i64,
    /// Identifier of the temporal-gate policy that was applied.
    pub gate_policy_id: String,
    /// Identifier of the model or tool that produced the artifact.
    pub model_id: String,
    /// Hash of the prompt that produced the artifact (caller-computed).
    pub hash_prompt: String,
    /// Lower-case hex SHA-256 of the artifact's bytes (the `sha256:` ascii
    /// prefix is permitted in the field but stripped before canonicalization).
    pub output_hash: String,
    /// Hex Merkle root over the gated context set.
    pub context_merkle_root: String,
    /// Caller-declared kind of artifact (e.g. `"text"`, `"code"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
    /// Caller-declared generation mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Hash algorithm name; conceptually defaults to `"sha256"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_alg: Option<String>,
    /// Hash of a normalized snapshot of the artifact, if one was taken.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_hash: Option<String>,
    /// Identifier of the normalization parameters used to produce `snapshot_hash`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalization_params_id: Option<String>,
    /// The proof-input manifest, embedded inline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_input: Option<serde_json::Value>,
    /// Hash of the proof-input manifest's non-signature canonical bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_input_hash: Option<String>,
}

/// `algorithm = "ed25519"` signature block attached to a proof-input manifest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignatureBlock {
    /// Fixed to `"ed25519"`.
    pub algorithm: String,
    /// Base64 of the 32-byte public key.
    pub public_key: String,
    /// Base64 of the 64-byte signature.
    pub signature_value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest32_hex_roundtrip() {
        let d = Digest32([0xab; 32]);
        let s = d.to_hex();
        assert_eq!(s.len(), 64);
        let back = Digest32::from_hex(&s).unwrap();
        assert_eq!(d, back);
    }

    #[test]
    fn digest32_rejects_wrong_length() {
        assert!(matches!(
            Digest32::from_hex("ab"),
            Err(TypesError::Length { expected: 32, actual: 1 })
        ));
    }

    #[test]
    fn context_item_serde_roundtrip() {
        let item = ContextItem {
            doc_id: "doc-1".into(),
            content_hash: Digest32([0x11; 32]),
            timestamp: 1_700_000_000,
            source_id: "corpus-a".into(),
        };
        let json = serde_json::to_string(&item).unwrap();
        let back: ContextItem = serde_json::from_str(&json).unwrap();
        assert_eq!(item, back);
    }

    #[test]
    fn capsule_optional_fields_omitted_when_none() {
        let capsule = ForensicCapsule {
            t_run: 1,
            t_target: 2,
            gate_policy_id: "strict".into(),
            model_id: "gpt-4".into(),
            hash_prompt: "deadbeef".into(),
            output_hash: "00".repeat(32),
            context_merkle_root: "00".repeat(32),
            artifact_type: None,
            mode: None,
            hash_alg: None,
            snapshot_hash: None,
            normalization_params_id: None,
            proof_input: None,
            proof_input_hash: None,
        };
        let v = serde_json::to_value(&capsule).unwrap();
        let obj = v.as_object().unwrap();
        assert!(!obj.contains_key("artifact_type"));
        assert!(!obj.contains_key("mode"));
    }
}
