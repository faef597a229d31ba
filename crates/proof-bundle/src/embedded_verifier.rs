//! The minimum-dependency verifier embedded into every bundle under
//! `verify/`. It is plain Python 3 standard library plus, optionally,
//! `cryptography` or `PyNaCl` for the Ed25519 check — when neither is
//! installed the script reports `SIGNATURE: UNKNOWN` rather than guessing.

const CANON_PY: &str = r#""""Deterministic canonical JSON, mirroring the Rust canonicalizer.

Rules: object keys sorted by code point, no separators whitespace, integers
only (floats raise), null-valued object members omitted, standard JSON
string escaping, non-ASCII emitted verbatim.
"""
import json


def canonize(value):
    return _write(value).encode("utf-8")


def _write(value):
    if value is None:
        return "null"
    if value is True:
        return "true"
    if value is False:
        return "false"
    if isinstance(value, int):
        return str(value)
    if isinstance(value, float):
        raise ValueError("non-integer numbers are not allowed in canonical form")
    if isinstance(value, str):
        return json.dumps(value, ensure_ascii=False)
    if isinstance(value, list):
        return "[" + ",".join(_write(v) for v in value) + "]"
    if isinstance(value, dict):
        keys = sorted(k for k, v in value.items() if v is not None)
        parts = [f"{json.dumps(k, ensure_ascii=False)}:{_write(value[k])}" for k in keys]
        return "{" + ",".join(parts) + "}"
    raise TypeError(f"unsupported canonical type: {type(value)!r}")
"#;

const VERIFY_BUNDLE_PY: &str = r#"#!/usr/bin/env python3
"""Standalone verifier for one proof bundle, no Rust toolchain required.

Usage: python3 verify_bundle.py <extracted-bundle-dir> [--artifact PATH] [--known-key BASE64]

The bundle must already be unzipped into <extracted-bundle-dir>, containing
forensic_capsule.json, ledger.sqlite, and proof_input.json at its root.
"""
import argparse
import base64
import hashlib
import json
import re
import sqlite3
import sys
from pathlib import Path

from canon import canonize

GENESIS = "0" * 64


def sha256_hex(data: bytes) -> str:
    return hashlib.sha256(data).hexdigest()


def verify_ledger(db_path: Path):
    conn = sqlite3.connect(str(db_path))
    try:
        rows = conn.execute(
            "SELECT id, t_run, capsule_hash, prev_hash, entry_hash FROM ledger ORDER BY id ASC"
        ).fetchall()
    finally:
        conn.close()
    if not rows:
        return False, rows
    expected = GENESIS
    for _id, t_run, capsule_hash, prev_hash, entry_hash in rows:
        if prev_hash != expected:
            return False, rows
        recomputed = sha256_hex(f"{expected}|{capsule_hash}|{t_run}".encode("utf-8"))
        if recomputed != entry_hash:
            return False, rows
        expected = entry_hash
    return True, rows


def capsule_bound(rows, capsule_hash: str) -> bool:
    """True iff some ledger row's capsule_hash matches (§4.7: most recent
    matching entry is the canonical binding; any match is enough to verify)."""
    return any(row[2] == capsule_hash for row in rows)


def verify_signature(manifest: dict):
    sig = manifest.get("signature")
    if not sig or sig.get("algorithm") != "ed25519":
        return "UNKNOWN"
    fields = {k: v for k, v in manifest.items() if k != "signature"}
    message = canonize(fields)
    public_key = base64.urlsafe_b64decode(sig["public_key"] + "==")
    signature = base64.urlsafe_b64decode(sig["signature_value"] + "==")
    try:
        from cryptography.hazmat.primitives.asymmetric.ed25519 import Ed25519PublicKey
        from cryptography.exceptions import InvalidSignature
    except ImportError:
        try:
            import nacl.signing
            import nacl.exceptions
        except ImportError:
            return "UNKNOWN"
        try:
            nacl.signing.VerifyKey(public_key).verify(message, signature)
            return "VALID"
        except nacl.exceptions.BadSignatureError:
            return "INVALID"
    try:
        Ed25519PublicKey.from_public_bytes(public_key).verify(signature, message)
        return "VALID"
    except InvalidSignature:
        return "INVALID"


def manifest_hash(manifest: dict) -> str:
    fields = {k: v for k, v in manifest.items() if k != "signature"}
    return sha256_hex(canonize(fields))


def detect_tvoc(output_text: str, t_target: int):
    years = {int(m.group(0)) for m in re.finditer(r"\b(19|20)\d{2}\b", output_text)}
    violating = sorted(y for y in years if y > t_target)
    return violating


def main() -> int:
    parser = argparse.ArgumentParser()
    parser.add_argument("bundle_dir")
    parser.add_argument("--artifact")
    parser.add_argument("--known-key")
    args = parser.parse_args()

    root = Path(args.bundle_dir)
    capsule_bytes = (root / "forensic_capsule.json").read_bytes()
    capsule = json.loads(capsule_bytes)
    capsule_hash = sha256_hex(capsule_bytes)

    manifest = json.loads((root / "proof_input.json").read_text())

    ledger_ok, rows = verify_ledger(root / "ledger.sqlite")
    print(f"LEDGER: {'VALID' if ledger_ok else 'INVALID'}")
    binding_ok = capsule_bound(rows, capsule_hash)
    print(f"CAPSULE_BINDING: {'VALID' if binding_ok else 'INVALID'}")
    print(f"PROOF_INPUT_HASH: {manifest_hash(manifest)}")
    signature_verdict = verify_signature(manifest)
    print(f"SIGNATURE: {signature_verdict}")

    origin_known = "UNKNOWN"
    if args.known_key and manifest.get("signature"):
        origin_known = "KNOWN" if manifest["signature"].get("public_key") == args.known_key else "UNKNOWN"
    print(f"ORIGIN_SPE: {origin_known}")

    object_ok = True
    if args.artifact:
        recomputed = sha256_hex(Path(args.artifact).read_bytes())
        declared = capsule["output_hash"]
        if declared.startswith("sha256:"):
            declared = declared[len("sha256:"):]
        object_ok = recomputed == declared
        print(f"OBJECT: {'MATCH' if object_ok else 'MISMATCH'}")

    ok = ledger_ok and binding_ok and signature_verdict in ("VALID", "UNKNOWN") and object_ok
    return 0 if ok else 1


if __name__ == "__main__":
    sys.exit(main())
"#;

/// Returns the embedded verifier's member names and contents, relative to
/// the bundle's `verify/` directory.
#[must_use]
pub fn embedded_verifier_files() -> Vec<(&'static str, &'static str)> {
    vec![("canon.py", CANON_PY), ("verify_bundle.py", VERIFY_BUNDLE_PY)]
}
