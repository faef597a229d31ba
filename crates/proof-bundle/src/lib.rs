#![forbid(unsafe_code)]
#![deny(missing_docs)]
//! Assembly and verification of the portable proof-bundle archive.
//!
//! A bundle is a ZIP file with four fixed members: `forensic_capsule.json`,
//! `ledger.sqlite`, `proof_input.json`, and an embedded Python verifier under
//! `verify/` that can check everything but the Ed25519 signature without any
//! third-party dependency (see [`embedded_verifier_files`]).
//!
//! Event sequence (high-level): bundle.assemble → bundle.verify

mod embedded_verifier;

pub use embedded_verifier::embedded_verifier_files;

use proof_canon::{sha256_hex, sha256_hex_file, CanonError};
use proof_capsule::ManifestError;
use proof_capsule::ProofInputManifest;
use proof_crypto::Verdict;
use proof_ledger::{Ledger, LedgerError, VerifyOutcome};
use proof_types::ForensicCapsule;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;
use zip::write::FileOptions;
use zip::ZipWriter;

const CAPSULE_MEMBER: &str = "forensic_capsule.json";
const LEDGER_MEMBER: &str = "ledger.sqlite";
const MANIFEST_MEMBER: &str = "proof_input.json";

/// Errors raised while assembling or verifying a bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    /// An I/O error occurred reading or writing archive members.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The ZIP container itself could not be read or written.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    /// A record failed to canonicalize.
    #[error("canonicalization error: {0}")]
    Canon(#[from] CanonError),
    /// A member's JSON could not be parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// The ledger store inside the bundle could not be opened or queried.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
    /// A required archive member was missing.
    #[error("bundle is missing required member: {0}")]
    MissingMember(&'static str),
    /// The proof-input manifest could not be hashed or verified.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

/// Assembles a bundle archive at `out_path` from its three data members plus
/// the embedded verifier.
///
/// `capsule` is written in its canonical byte form, so a verifier can hash
/// the archived file directly without re-serializing it. `ledger_path` must
/// point at an existing SQLite file (typically produced by [`Ledger::open`]).
///
/// # Errors
///
/// Returns `BundleError::Io`/`Zip` on archive I/O failure, or
/// `BundleError::Canon` if the capsule cannot be canonicalized.
pub fn assemble(
    capsule: &ForensicCapsule,
    ledger_path: impl AsRef<Path>,
    manifest: &ProofInputManifest,
    out_path: impl AsRef<Path>,
) -> Result<(), BundleError> {
    let capsule_bytes = proof_capsule::canonical_bytes(capsule)?;
    let ledger_bytes = fs::read(ledger_path)?;
    let manifest_bytes = serde_json::to_vec(manifest)?;

    let file = fs::File::create(out_path)?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file(CAPSULE_MEMBER, options)?;
    zip.write_all(&capsule_bytes)?;

    zip.start_file(LEDGER_MEMBER, options)?;
    zip.write_all(&ledger_bytes)?;

    zip.start_file(MANIFEST_MEMBER, options)?;
    zip.write_all(&manifest_bytes)?;

    for (name, contents) in embedded_verifier_files() {
        zip.start_file(format!("verify/{name}"), options)?;
        zip.write_all(contents.as_bytes())?;
    }

    zip.finish()?;
    Ok(())
}

/// Outcome of comparing a recomputed artifact hash to the capsule's
/// declared `output_hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectVerdict {
    /// The recomputed hash matches.
    Match,
    /// The recomputed hash does not match.
    Mismatch,
}

/// The full outcome of verifying one bundle.
#[derive(Debug, Clone)]
pub struct VerifyReport {
    /// Recomputed SHA-256 hex of the capsule's archived canonical bytes.
    pub capsule_hash: String,
    /// Result of walking the ledger's hash chain.
    pub ledger: VerifyOutcome,
    /// Whether the recomputed capsule hash matches the ledger's final entry.
    pub capsule_binding: ObjectVerdict,
    /// Verdict on the manifest's attached signature, if any.
    pub signature: Verdict,
    /// Recomputed hash of the manifest's canonical bytes (signature excluded).
    pub proof_input_hash: String,
    /// Whether the attached public key matches a configured production key.
    pub origin_known: Option<bool>,
    /// Result of comparing an externally supplied artifact to `output_hash`,
    /// if one was supplied.
    pub object: Option<ObjectVerdict>,
}

impl VerifyReport {
    /// Renders the verdicts as the fixed-order lines the CLI prints, per the
    /// bundle verifier's external contract: `LEDGER`, `CAPSULE_BINDING`,
    /// `PROOF_INPUT_HASH`, `SIGNATURE`, `ORIGIN_SPE`, then `OBJECT` last and
    /// only when an artifact was supplied.
    #[must_use]
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "LEDGER: {}",
                if self.ledger == VerifyOutcome::Valid { "VALID" } else { "INVALID" }
            ),
            format!(
                "CAPSULE_BINDING: {}",
                if self.capsule_binding == ObjectVerdict::Match { "VALID" } else { "INVALID" }
            ),
            format!("PROOF_INPUT_HASH: {}", self.proof_input_hash),
            format!("SIGNATURE: {}", self.signature.as_str()),
            format!(
                "ORIGIN_SPE: {}",
                match self.origin_known {
                    Some(true) => "KNOWN",
                    _ => "UNKNOWN",
                }
            ),
        ];
        if let Some(object) = self.object {
            lines.push(format!(
                "OBJECT: {}",
                if object == ObjectVerdict::Match { "MATCH" } else { "MISMATCH" }
            ));
        }
        lines
    }
}

/// Verifies one bundle archive end to end.
///
/// `artifact_path`, if given, is hashed and compared to the capsule's
/// `output_hash` (any leading `sha256:` is stripped before comparison).
/// `known_production_key_b64`, if given, is compared against the manifest's
/// attached public key to resolve `ORIGIN_SPE`.
///
/// # Errors
///
/// Returns `BundleError` if the archive cannot be read, a required member is
/// missing, or a member fails to parse.
pub fn verify(
    bundle_path: impl AsRef<Path>,
    artifact_path: Option<&Path>,
    known_production_key_b64: Option<&str>,
) -> Result<VerifyReport, BundleError> {
    let file = fs::File::open(bundle_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let capsule_bytes = read_member(&mut archive, CAPSULE_MEMBER)?;
    let capsule_hash = sha256_hex(&capsule_bytes);

    let ledger_bytes = read_member(&mut archive, LEDGER_MEMBER)?;
    let manifest_bytes = read_member(&mut archive, MANIFEST_MEMBER)?;
    let manifest: ProofInputManifest = serde_json::from_slice(&manifest_bytes)?;
    let capsule: ForensicCapsule = serde_json::from_slice(&capsule_bytes)?;

    let tmp = tempfile_for_ledger(&ledger_bytes)?;
    let ledger = Ledger::open(&tmp)?;
    let ledger_outcome = ledger.verify()?;
    let binding = ledger.capsule_binding(&capsule_hash)?;
    let capsule_binding = if binding.is_some() { ObjectVerdict::Match } else { ObjectVerdict::Mismatch };
    let _ = fs::remove_file(&tmp);

    let signature = manifest.verify_signature()?;
    let proof_input_hash = manifest.hash()?;

    let origin_known = known_production_key_b64.map(|known| {
        manifest
            .signature
            .as_ref()
            .is_some_and(|sig| sig.public_key == known)
    });

    let object = artifact_path
        .map(|path| -> Result<ObjectVerdict, BundleError> {
            let recomputed = sha256_hex_file(path)?;
            let declared = capsule.output_hash.strip_prefix("sha256:").unwrap_or(&capsule.output_hash);
            Ok(if recomputed == declared {
                ObjectVerdict::Match
            } else {
                ObjectVerdict::Mismatch
            })
        })
        .transpose()?;

    Ok(VerifyReport {
        capsule_hash,
        ledger: ledger_outcome,
        capsule_binding,
        signature,
        proof_input_hash,
        origin_known,
        object,
    })
}

fn read_member(
    archive: &mut zip::ZipArchive<fs::File>,
    name: &'static str,
) -> Result<Vec<u8>, BundleError> {
    let mut entry = archive
        .by_name(name)
        .map_err(|_| BundleError::MissingMember(name))?;
    let mut buf = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut buf)?;
    Ok(buf)
}

fn tempfile_for_ledger(bytes: &[u8]) -> Result<std::path::PathBuf, BundleError> {
    let mut path = std::env::temp_dir();
    let unique = sha256_hex(bytes);
    path.push(format!("proof-bundle-ledger-{unique}.sqlite"));
    fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proof_capsule::{capsule_hash as compute_capsule_hash, CapsuleBuilder};

    fn sample_capsule() -> ForensicCapsule {
        CapsuleBuilder::new()
            .t_run(1)
            .t_target(2025)
            .gate_policy_id("none")
            .model_id("gpt-4")
            .hash_prompt("deadbeef")
            .output_hash("00".repeat(32))
            .context_merkle_root("11".repeat(32))
            .build()
            .unwrap()
    }

    #[test]
    fn assemble_then_verify_reports_valid_ledger_and_binding() {
        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.sqlite");
        let bundle_path = dir.path().join("bundle.zip");

        let capsule = sample_capsule();
        let hash = compute_capsule_hash(&capsule).unwrap();

        let ledger = Ledger::open(&ledger_path).unwrap();
        ledger.append(&hash, 1).unwrap();
        drop(ledger);

        let manifest = ProofInputManifest::new();
        assemble(&capsule, &ledger_path, &manifest, &bundle_path).unwrap();

        let report = verify(&bundle_path, None, None).unwrap();
        assert_eq!(report.ledger, VerifyOutcome::Valid);
        assert_eq!(report.capsule_binding, ObjectVerdict::Match);
        assert_eq!(report.signature, Verdict::Unknown);
    }

    #[test]
    fn verify_detects_a_capsule_not_bound_by_the_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.sqlite");
        let bundle_path = dir.path().join("bundle.zip");

        let capsule = sample_capsule();
        let ledger = Ledger::open(&ledger_path).unwrap();
        ledger.append(&"ff".repeat(32), 1).unwrap(); // unrelated capsule hash
        drop(ledger);

        let manifest = ProofInputManifest::new();
        assemble(&capsule, &ledger_path, &manifest, &bundle_path).unwrap();

        let report = verify(&bundle_path, None, None).unwrap();
        assert_eq!(report.ledger, VerifyOutcome::Valid);
        assert_eq!(report.capsule_binding, ObjectVerdict::Mismatch);
    }

    #[test]
    fn verify_binds_to_an_earlier_entry_when_the_ledger_outgrew_this_capsule() {
        // A ledger shared across several proof runs: this capsule's entry is
        // no longer the tip, but it must still bind (§4.7: search for the
        // most recent matching entry, not just the last row).
        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.sqlite");
        let bundle_path = dir.path().join("bundle.zip");

        let capsule = sample_capsule();
        let hash = compute_capsule_hash(&capsule).unwrap();

        let ledger = Ledger::open(&ledger_path).unwrap();
        ledger.append(&hash, 1).unwrap();
        ledger.append(&"cc".repeat(32), 2).unwrap();
        ledger.append(&"dd".repeat(32), 3).unwrap();
        drop(ledger);

        let manifest = ProofInputManifest::new();
        assemble(&capsule, &ledger_path, &manifest, &bundle_path).unwrap();

        let report = verify(&bundle_path, None, None).unwrap();
        assert_eq!(report.ledger, VerifyOutcome::Valid);
        assert_eq!(report.capsule_binding, ObjectVerdict::Match);
    }

    #[test]
    fn verify_checks_signed_manifest_and_origin_key() {
        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.sqlite");
        let bundle_path = dir.path().join("bundle.zip");

        let capsule = sample_capsule();
        let hash = compute_capsule_hash(&capsule).unwrap();
        let ledger = Ledger::open(&ledger_path).unwrap();
        ledger.append(&hash, 1).unwrap();
        drop(ledger);

        let mut manifest = ProofInputManifest::new();
        manifest.set("origin", "attestation-service");
        manifest.sign(&[42u8; 32]).unwrap();
        let known_key = manifest.signature.as_ref().unwrap().public_key.clone();

        assemble(&capsule, &ledger_path, &manifest, &bundle_path).unwrap();

        let report = verify(&bundle_path, None, Some(&known_key)).unwrap();
        assert_eq!(report.signature, Verdict::Valid);
        assert_eq!(report.origin_known, Some(true));
    }

    #[test]
    fn to_lines_emits_verdicts_in_the_fixed_external_order() {
        let report = VerifyReport {
            capsule_hash: "00".repeat(32),
            ledger: VerifyOutcome::Valid,
            capsule_binding: ObjectVerdict::Match,
            signature: Verdict::Unknown,
            proof_input_hash: "11".repeat(32),
            origin_known: None,
            object: Some(ObjectVerdict::Match),
        };
        let lines = report.to_lines();
        let names: Vec<String> = lines
            .iter()
            .map(|l| l.split(':').next().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["LEDGER", "CAPSULE_BINDING", "PROOF_INPUT_HASH", "SIGNATURE", "ORIGIN_SPE", "OBJECT"]
        );
    }

    #[test]
    fn to_lines_omits_object_when_no_artifact_was_supplied() {
        let report = VerifyReport {
            capsule_hash: "00".repeat(32),
            ledger: VerifyOutcome::Valid,
            capsule_binding: ObjectVerdict::Match,
            signature: Verdict::Unknown,
            proof_input_hash: "11".repeat(32),
            origin_known: None,
            object: None,
        };
        assert!(!report.to_lines().iter().any(|l| l.starts_with("OBJECT")));
    }
}
