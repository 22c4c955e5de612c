//! # Canonical serialization
//!
//! Produces the deterministic byte encoding that every signer, verifier,
//! and hasher in the workspace consumes. Two independently-implemented
//! peers must produce identical bytes for identical logical content, so
//! the format is rigid:
//!
//! - Object keys are sorted lexicographically (UTF-8 byte order) at every
//!   nesting level.
//! - Arrays preserve source order.
//! - No whitespace anywhere.
//! - Strings use standard JSON escaping; integers print in plain decimal.
//! - Floats are rejected outright: an f64 cannot be round-tripped
//!   identically across implementations, so payloads must carry integers
//!   or strings instead.
//!
//! ## Security Invariants
//!
//! This routine is implemented exactly once. Signing and verification
//! functions accept [`CanonicalBytes`] — not `&[u8]` — so a payload that
//! bypassed canonicalization cannot reach a digest or signature.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors from canonical byte production.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// The input contained a float, which has no deterministic
    /// cross-implementation encoding.
    #[error("float values cannot be canonicalized: {0}")]
    FloatNotAllowed(String),

    /// The input could not be converted to a JSON value.
    #[error("JSON conversion failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// The canonical byte encoding of a structured value.
///
/// This is the exact byte sequence that gets hashed and signed. Construct
/// it via [`CanonicalBytes::new`] (from any `Serialize` type) or
/// [`CanonicalBytes::from_value`] (from an already-built JSON value).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError::FloatNotAllowed`] if the value
    /// contains a float at any depth.
    pub fn new<T: Serialize>(value: &T) -> Result<Self, CanonicalizationError> {
        Self::from_value(serde_json::to_value(value)?)
    }

    /// Canonicalize a JSON value.
    pub fn from_value(value: Value) -> Result<Self, CanonicalizationError> {
        let mut out = Vec::with_capacity(128);
        write_canonical(&value, &mut out)?;
        Ok(Self(out))
    }

    /// The canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Byte length of the encoding.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the encoding is empty (never true for valid JSON input).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for CanonicalBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Canonical bytes are always valid UTF-8: they are compact JSON.
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                out.extend_from_slice(i.to_string().as_bytes());
            } else if let Some(u) = n.as_u64() {
                out.extend_from_slice(u.to_string().as_bytes());
            } else {
                return Err(CanonicalizationError::FloatNotAllowed(n.to_string()));
            }
        }
        Value::String(s) => {
            // serde_json applies standard JSON escaping.
            serde_json::to_writer(&mut *out, s)?;
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out)?;
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            out.push(b'{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                serde_json::to_writer(&mut *out, key)?;
                out.push(b':');
                write_canonical(&map[key.as_str()], out)?;
            }
            out.push(b'}');
        }
    }
    Ok(())
}
