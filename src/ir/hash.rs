//! Content hashing for method bodies using blake3.
//!
//! Two method slots with equal `(name, descriptor)` are compared by the hash
//! of their executable body; a differing hash is a redefinition.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHash([u8; 32]);

impl BodyHash {
    /// Create a new BodyHash from raw bytes.
    #[inline]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash an executable body.
    pub fn of(body: impl AsRef<[u8]>) -> Self {
        Self(*blake3::hash(body.as_ref()).as_bytes())
    }

    /// Get the raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hash of an abstract method (no body).
    #[inline]
    pub const fn empty() -> Self {
        Self([0; 32])
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == [0; 32]
    }

    /// Convert to hex string.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }
}

impl Default for BodyHash {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Display for BodyHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First 16 hex chars are enough to tell bodies apart in logs
        write!(f, "{}", &self.to_hex()[..16])
    }
}

// Hex on the wire keeps patch messages and recorded sessions readable.
impl Serialize for BodyHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for BodyHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).ok_or_else(|| serde::de::Error::custom("invalid body hash"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_distinguishes_bodies() {
        assert_eq!(BodyHash::of("return 1"), BodyHash::of("return 1"));
        assert_ne!(BodyHash::of("return 1"), BodyHash::of("return 2"));
    }

    #[test]
    fn test_hex_roundtrip() {
        let hash = BodyHash::of("iconst_1\nireturn");
        assert_eq!(BodyHash::from_hex(&hash.to_hex()), Some(hash));
        assert_eq!(BodyHash::from_hex("abcd"), None);
        assert_eq!(BodyHash::from_hex("not hex"), None);
    }

    #[test]
    fn test_empty() {
        assert!(BodyHash::empty().is_empty());
        assert!(!BodyHash::of("").is_empty());
        assert_eq!(format!("{}", BodyHash::empty()), "0000000000000000");
    }
}
