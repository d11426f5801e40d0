//! 128-bit subject identifiers.

use std::fmt;

use crate::error::StoreError;

/// Opaque 128-bit identifier of a subject/trail.
///
/// Stored as a plain `u128` rather than a sharded pair so that it slots
/// directly into a hash map keyed by 128-bit values; the high 64 bits are exposed separately for
/// callers that want to shard on them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Uuid(pub u128);

impl Uuid {
    pub fn from_hex(s: &str) -> Result<Self, StoreError> {
        let s = s.trim();
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(StoreError::BadUuid(s.to_string()));
        }
        u128::from_str_radix(s, 16)
            .map(Uuid)
            .map_err(|_| StoreError::BadUuid(s.to_string()))
    }

    pub fn to_hex(self) -> String {
        format!("{:032x}", self.0)
    }

    /// High 64 bits, usable as a shard key for a striped global state map.
    pub fn shard_key(self) -> u64 {
        (self.0 >> 64) as u64
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uuid({})", self.to_hex())
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let hex = "0123456789abcdef0123456789abcdef";
        let uuid = Uuid::from_hex(hex).unwrap();
        assert_eq!(uuid.to_hex(), hex);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Uuid::from_hex("abcd").is_err());
    }

    #[test]
    fn rejects_non_hex() {
        assert!(Uuid::from_hex(&"z".repeat(32)).is_err());
    }
}
