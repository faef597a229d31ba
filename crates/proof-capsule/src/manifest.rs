use proof_canon::{canonize, sha256_hex, CanonError};
use proof_crypto::{verify_b64, SecretKey, Verdict};
use proof_types::SignatureBlock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while hashing, signing, or verifying a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest's fields could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canon(#[from] CanonError),
    /// A crypto primitive rejected malformed key or signature material.
    #[error("crypto error: {0}")]
    Crypto(#[from] proof_crypto::CryptoError),
}

/// An open key/value record describing a certification request (origin
/// hints, artifact metadata, timestamps), with an optional attached
/// Ed25519 signature.
///
/// The `signature` field is never part of the canonical bytes used for
/// hashing or signing — it sits beside the open fields, not inside them.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProofInputManifest {
    /// Arbitrary scalar metadata supplied by the caller.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// The attached signature block, if the manifest has been signed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureBlock>,
}

impl ProofInputManifest {
    /// Starts an empty manifest with no fields and no signature.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a metadata field. Setting a key literally named `"signature"`
    /// has no effect on the attached signature block: the two are stored
    /// and canonicalized independently.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    fn canonical_bytes_without_signature(&self) -> Result<Vec<u8>, CanonError> {
        canonize(&Value::Object(self.fields.clone()))
    }

    /// Computes `SHA-256` of the manifest's canonical bytes, excluding any
    /// signature, rendered lower-case hex.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::Canon` if the fields cannot be canonicalized
    /// (a non-finite number, for instance).
    pub fn hash(&self) -> Result<String, ManifestError> {
        Ok(sha256_hex(&self.canonical_bytes_without_signature()?))
    }

    /// Signs the manifest's canonical bytes with `seed` and attaches the
    /// resulting `ed25519` signature block, replacing any prior signature.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::Canon` if the fields cannot be canonicalized.
    pub fn sign(&mut self, seed: &[u8; 32]) -> Result<(), ManifestError> {
        let bytes = self.canonical_bytes_without_signature()?;
        let signature = proof_crypto::sign(seed, &bytes);
        let verifying_key = SecretKey(*seed).verifying_key();
        self.signature = Some(SignatureBlock {
            algorithm: "ed25519".into(),
            public_key: proof_crypto::b64_encode(verifying_key.as_bytes()),
            signature_value: proof_crypto::b64_encode(&signature),
        });
        Ok(())
    }

    /// Verifies the attached signature, if any, against the manifest's
    /// canonical bytes (with the signature itself stripped out first).
    ///
    /// Returns `Verdict::Unknown` when no signature is attached, or when the
    /// attached algorithm is not recognized; a recognized but failing
    /// signature yields `Verdict::Invalid`, never an error.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::Canon` if the fields cannot be canonicalized,
    /// or `ManifestError::Crypto` if the attached key/signature bytes are
    /// the wrong length to decode.
    pub fn verify_signature(&self) -> Result<Verdict, ManifestError> {
        let Some(sig) = &self.signature else {
            return Ok(Verdict::Unknown);
        };
        if sig.algorithm != "ed25519" {
            return Ok(Verdict::Unknown);
        }
        let bytes = self.canonical_bytes_without_signature()?;
        Ok(verify_b64(&sig.public_key, &bytes, &sig.signature_value)?)
    }
}
