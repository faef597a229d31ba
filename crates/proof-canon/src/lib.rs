#![forbid(unsafe_code)]
#![deny(missing_docs)]
//! Deterministic record canonicalization and SHA-256 hashing.
//!
//! [`canonize`] turns any `Serialize` value into byte-exact, platform-stable
//! output: object keys sorted by code point, no structural whitespace,
//! integers only, and `null`-valued object members dropped entirely rather
//! than written out. Two records that differ only in key order or in the
//! presence of a null-valued field hash identically.

use serde::Serialize;
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Errors raised while canonicalizing a record.
#[derive(Debug, Error)]
pub enum CanonError {
    /// The value contained a non-finite or floating-point number.
    #[error("non-integer numbers are not allowed in canonical form")]
    FloatNotAllowed,
    /// `serde_json` failed to convert the value.
    #[error("serialization error: {0}")]
    Serde(String),
    /// An I/O error occurred while hashing a file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Canonicalizes any `Serialize` value into deterministic UTF-8 bytes.
///
/// # Errors
///
/// Returns `CanonError::FloatNotAllowed` if the value contains a
/// floating-point number, or `CanonError::Serde` if it cannot be converted
/// to a `serde_json::Value` at all.
pub fn canonize<T: Serialize>(value: &T) -> Result<Vec<u8>, CanonError> {
    let v = serde_json::to_value(value).map_err(|e| CanonError::Serde(e.to_string()))?;
    let mut out = Vec::with_capacity(256);
    write_canonical(&v, &mut out)?;
    Ok(out)
}

fn write_canonical(v: &Value, out: &mut Vec<u8>) -> Result<(), CanonError> {
    match v {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        Value::Number(n) => write_number(n, out)?,
        Value::String(s) => write_string(s, out)?,
        Value::Array(arr) => {
            out.push(b'[');
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out)?;
            }
            out.push(b']');
        }
        Value::Object(obj) => {
            out.push(b'{');
            let mut keys: Vec<&String> = obj
                .iter()
                .filter(|(_, val)| !val.is_null())
                .map(|(k, _)| k)
                .collect();
            keys.sort_unstable();
            for (i, k) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_string(k, out)?;
                out.push(b':');
                write_canonical(&obj[*k], out)?;
            }
            out.push(b'}');
        }
    }
    Ok(())
}

fn write_number(n: &Number, out: &mut Vec<u8>) -> Result<(), CanonError> {
    if n.is_f64() {
        return Err(CanonError::FloatNotAllowed);
    }
    let s = if let Some(u) = n.as_u64() {
        u.to_string()
    } else if let Some(i) = n.as_i64() {
        i.to_string()
    } else {
        return Err(CanonError::FloatNotAllowed);
    };
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

fn write_string(s: &str, out: &mut Vec<u8>) -> Result<(), CanonError> {
    let escaped = serde_json::to_string(s).map_err(|e| CanonError::Serde(e.to_string()))?;
    out.extend_from_slice(escaped.as_bytes());
    Ok(())
}

/// Computes the SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Computes the SHA-256 digest of `bytes`, rendered as lower-case hex.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(sha256(bytes))
}

/// Streams a file in fixed-size blocks and returns its SHA-256 digest as
/// lower-case hex. Produces the same digest as `sha256_hex(&fs::read(path)?)`.
///
/// # Errors
///
/// Returns `CanonError::Io` if the file cannot be opened or read.
pub fn sha256_hex_file(path: impl AsRef<Path>) -> Result<String, CanonError> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_is_irrelevant() {
        let a = json!({"z": 1, "a": 2});
        let b = json!({"a": 2, "z": 1});
        assert_eq!(canonize(&a).unwrap(), canonize(&b).unwrap());
    }

    #[test]
    fn null_valued_fields_are_omitted() {
        let with_null = json!({"a": 1, "b": null});
        let without = json!({"a": 1});
        assert_eq!(canonize(&with_null).unwrap(), canonize(&without).unwrap());
    }

    #[test]
    fn floats_are_rejected() {
        let v = json!({"a": 1.5});
        assert!(matches!(canonize(&v), Err(CanonError::FloatNotAllowed)));
    }

    #[test]
    fn strings_escape_control_chars_and_keep_unicode_verbatim() {
        let v = json!({"s": "a\nb\"c\\d\u{00e9}"});
        let bytes = canonize(&v).unwrap();
        let s = String::from_utf8(bytes).unwrap();
        assert!(s.contains("\\n"));
        assert!(s.contains('\u{00e9}')); // non-ASCII emitted verbatim, not \u-escaped
    }

    #[test]
    fn sha256_hex_matches_known_vector() {
        // SHA-256("") per the empty-context scenario in the proof spec.
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_hex_file_matches_in_memory_hash() {
        let tmp = std::env::temp_dir().join("proof-canon-test-file.txt");
        std::fs::write(&tmp, b"The answer to life is 42.").unwrap();
        let streamed = sha256_hex_file(&tmp).unwrap();
        let direct = sha256_hex(b"The answer to life is 42.");
        assert_eq!(streamed, direct);
        let _ = std::fs::remove_file(&tmp);
    }
}
