// Core primitives shared by the chain view
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub type Height = u32;
pub type Timestamp = u64;
pub type Weight = u128;

/// SHA-256 digest used for header and summary identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Hash256(#[serde(with = "hex::serde")] pub [u8; 32]);

impl Hash256 {
    pub fn zero() -> Self {
        Hash256([0u8; 32])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn from_data(data: &[u8]) -> Self {
        hash_data(data)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Hash256(arr))
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Protocol constants used as configuration defaults
pub struct Policy;

impl Policy {
    /// Blocks between two sub-epoch summaries
    pub const SUB_EPOCH_BLOCKS: u32 = 32;

    /// Largest height span a weight proof may leave unsampled
    pub const MAX_SAMPLE_GAP: u32 = 2 * Self::SUB_EPOCH_BLOCKS;

    /// Minimum number of sampled checkpoint headers per proof
    pub const MIN_CHECKPOINT_SAMPLES: usize = 3;

    /// Smallest weight a single header may contribute
    pub const MIN_DIFFICULTY: u64 = 1;

    /// Heights below the peak that keep every header as a checkpoint. Older
    /// checkpoints survive only at sub-epoch boundaries.
    pub const RECENT_WINDOW: u32 = 4 * Self::SUB_EPOCH_BLOCKS;

    /// Target block time in seconds
    pub const BLOCK_TIME: u64 = 18;
}

pub fn hash_data(data: &[u8]) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Hash256(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let hash = hash_data(b"peak");
        assert_eq!(Hash256::from_hex(&hash.to_hex()), Some(hash));
        assert_eq!(Hash256::from_hex("abcd"), None);
        assert_eq!(Hash256::from_hex("zz"), None);
    }

    #[test]
    fn test_zero_hash() {
        assert!(Hash256::zero().is_zero());
        assert!(!hash_data(b"").is_zero());
        assert_eq!(Hash256::default(), Hash256::zero());
    }
}
