use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic configuration ID (BLAKE3 of the canonical config JSON)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content hash of a committed score-frame sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameDigest(pub String);

impl fmt::Display for FrameDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_hash_deterministic() {
        assert_eq!(ConfigHash::from_bytes(b"abc"), ConfigHash::from_bytes(b"abc"));
        assert_ne!(ConfigHash::from_bytes(b"abc"), ConfigHash::from_bytes(b"abd"));
    }

    #[test]
    fn short_hash_prefix() {
        let hash = ConfigHash::from_bytes(b"abc");
        assert_eq!(hash.short().len(), 12);
        assert!(hash.0.starts_with(hash.short()));
    }
}
