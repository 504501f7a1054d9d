//! Plan version tokens
//!
//! Provides [`PlanHash`], the 32-byte SHA-256 digest of a canonical plan.
//! Its text form is unpadded base64url and is the exact string carried in
//! `if-match` headers and `planHash` response fields.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::canonical::canonicalize;
use crate::plan::Plan;

/// Length of the text form: 32 bytes in unpadded base64.
pub const ENCODED_LEN: usize = 43;

/// A 32-byte plan version token (SHA-256)
///
/// Opaque outside this module: compare for equality, never order or inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanHash([u8; 32]);

impl PlanHash {
    /// Create from raw digest bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create hash from byte slice
    ///
    /// # Errors
    /// Returns error if slice length is not exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, HashError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| HashError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// SHA-256 of arbitrary bytes
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Version token of a plan
    ///
    /// Canonicalizes first, clears `meta.planHash`, and hashes the compact
    /// JSON encoding. Struct fields serialize in declaration order and every
    /// free-form object has sorted keys after canonicalization, so the bytes
    /// are stable.
    ///
    /// # Errors
    /// Returns error if serialization fails, which only happens for values
    /// that could not have come from a parsed plan.
    pub fn of_plan(plan: &Plan) -> Result<Self, HashError> {
        let bytes = hash_input(plan)?;
        Ok(Self::compute(&bytes))
    }

    /// Short prefix of the text form, for log lines
    #[must_use]
    pub fn short(&self) -> String {
        let mut s = self.to_string();
        s.truncate(12);
        s
    }
}

/// Bytes that [`PlanHash::of_plan`] digests
pub(crate) fn hash_input(plan: &Plan) -> Result<Vec<u8>, HashError> {
    let mut canonical = canonicalize(plan);
    canonical.meta.plan_hash = None;
    Ok(serde_json::to_vec(&canonical)?)
}

impl Display for PlanHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(self.0))
    }
}

impl FromStr for PlanHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ENCODED_LEN {
            return Err(HashError::InvalidEncodedLength {
                expected: ENCODED_LEN,
                actual: s.len(),
            });
        }
        let bytes = URL_SAFE_NO_PAD.decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl serde::Serialize for PlanHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for PlanHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when working with plan hashes
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// Invalid digest length
    #[error("invalid hash length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Invalid text length
    #[error("invalid hash encoding length: expected {expected} chars, got {actual}")]
    InvalidEncodedLength { expected: usize, actual: usize },

    /// Not base64url
    #[error("base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_is_deterministic() {
        assert_eq!(PlanHash::compute(b"plan"), PlanHash::compute(b"plan"));
        assert_ne!(PlanHash::compute(b"plan"), PlanHash::compute(b"plan "));
    }

    #[test]
    fn text_form_is_unpadded_base64url() {
        let hash = PlanHash::new([0xfb; 32]);
        let s = hash.to_string();
        assert_eq!(s.len(), ENCODED_LEN);
        assert!(!s.contains('='));
        assert!(!s.contains('+'));
        assert!(!s.contains('/'));
        assert!(s.contains('-') || s.contains('_'));
    }

    #[test]
    fn known_digest_of_empty_input() {
        // SHA-256("") in base64url
        assert_eq!(
            PlanHash::compute(b"").to_string(),
            "47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU"
        );
    }

    #[test]
    fn parse_round_trips_display() {
        let hash = PlanHash::compute(b"abc");
        let parsed: PlanHash = hash.to_string().parse().unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = "abc".parse::<PlanHash>().unwrap_err();
        assert!(matches!(
            err,
            HashError::InvalidEncodedLength { expected: 43, actual: 3 }
        ));
    }

    #[test]
    fn parse_rejects_standard_alphabet() {
        let s = format!("{}+", "A".repeat(42));
        assert!(matches!(s.parse::<PlanHash>(), Err(HashError::Decode(_))));
    }

    #[test]
    fn from_slice_rejects_short_input() {
        assert!(matches!(
            PlanHash::from_slice(&[1u8; 31]),
            Err(HashError::InvalidLength { expected: 32, actual: 31 })
        ));
    }

    #[test]
    fn serde_uses_text_form() {
        let hash = PlanHash::compute(b"test");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{hash}\""));
        let decoded: PlanHash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, decoded);
    }

    #[test]
    fn short_is_prefix() {
        let hash = PlanHash::compute(b"test");
        assert!(hash.to_string().starts_with(&hash.short()));
        assert_eq!(hash.short().len(), 12);
    }
}
